//! Integration tests for the exporter
//!
//! These tests use wiremock to stand in for the dev site, the platform asset
//! host, and the library host, and run full exports end-to-end.

use flowbake::config::Config;
use flowbake::crawler::{run_export, AssetPatterns, BuildOptions, Exporter, RetryPolicy};
use flowbake::output::{BundleFile, DirectoryMaterializer, ExportBundle, Materializer};
use flowbake::{BakeError, RetryingFetcher, Site};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TARGET: &str = "https://www.example.com";

const STYLESHEET: &str = "body{margin:0}.hero{color:red}.post-title{font-size:2em}.unused{color:blue}";

/// Mock servers for one site
struct TestSite {
    dev: MockServer,
    cdn: MockServer,
    lib: MockServer,
}

impl TestSite {
    async fn start() -> Self {
        let site = Self {
            dev: MockServer::start().await,
            cdn: MockServer::start().await,
            lib: MockServer::start().await,
        };
        site.mount_assets().await;
        site
    }

    fn host(server: &MockServer) -> String {
        server.uri().trim_start_matches("http://").to_string()
    }

    fn image_url(&self) -> String {
        format!("{}/img/img1.png", self.cdn.uri())
    }

    /// A page of the site with the platform's asset references around `body`
    fn page(&self, body: &str) -> String {
        format!(
            r#"<!DOCTYPE html><html data-wf-site="1"><head>
<link href="{cdn}/css/site.css" rel="stylesheet" type="text/css"/>
</head><body>{body}
<script src="{lib}/js/jquery-3.5.1.min.js" type="text/javascript" crossorigin="anonymous"></script>
<script src="{cdn}/js/site.js" type="text/javascript"></script>
</body></html>"#,
            cdn = self.cdn.uri(),
            lib = self.lib.uri(),
            body = body
        )
    }

    async fn mount_assets(&self) {
        mount_body(&self.cdn, "/css/site.css", 200, STYLESHEET).await;
        mount_body(&self.cdn, "/js/site.js", 200, "document.body.classList.add('ready');").await;
        mount_body(&self.lib, "/js/jquery-3.5.1.min.js", 200, "/* jQuery */").await;
    }

    async fn mount_page(&self, route: &str, body: &str) {
        mount_body(&self.dev, route, 200, &self.page(body)).await;
    }

    async fn mount_error_page(&self) {
        mount_body(&self.dev, "/404", 404, &self.page("<h1>Not found</h1>")).await;
    }

    /// Serves the marked image exactly once
    async fn mount_image_once(&self) {
        Mock::given(method("GET"))
            .and(path("/img/img1.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x89, 0x50, 0x4e, 0x47]))
            .expect(1)
            .mount(&self.cdn)
            .await;
    }

    fn exporter(&self) -> Exporter {
        let site = Site::new(&self.dev.uri(), TARGET).expect("valid hosts");
        let fetcher = RetryingFetcher::new(
            reqwest::Client::new(),
            RetryPolicy::new(2, Duration::from_millis(1)),
        );
        let options = BuildOptions {
            concurrency: 4,
            patterns: AssetPatterns::new(&[Self::host(&self.cdn)], &[Self::host(&self.lib)])
                .expect("valid patterns"),
            ..BuildOptions::default()
        };
        Exporter::new(site, fetcher, options)
    }

    fn config(&self) -> Config {
        let mut config = Config {
            site: self.dev.uri(),
            target_host: TARGET.to_string(),
            ..Config::default()
        };
        config.fetch.max_attempts = 1;
        config.fetch.retry_delay_secs = 0;
        config.platform.asset_hosts = vec![Self::host(&self.cdn)];
        config.platform.library_hosts = vec![Self::host(&self.lib)];
        config
    }
}

async fn mount_body(server: &MockServer, route: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

fn text<'a>(bundle: &'a ExportBundle, file: &str) -> &'a str {
    bundle
        .text(file)
        .unwrap_or_else(|| panic!("bundle has no text file {}", file))
}

#[tokio::test]
async fn test_export_without_upstream_sitemap() {
    let site = TestSite::start().await;

    site.mount_page(
        "/",
        r#"<div class="hero">
            <a href="/about">About</a>
            <a href="/thanks" sb-skip-sitemap>Thanks</a>
            <a href="/blog/post-1">Post</a>
            <a href="https://elsewhere.com/">Out</a>
        </div>"#,
    )
    .await;
    let image = format!(r#"<img src="{}" sb-process alt="">"#, site.image_url());
    site.mount_page("/about", &image).await;
    site.mount_page("/thanks", "<p>Thanks!</p>").await;
    site.mount_page(
        "/blog/post-1",
        &format!(r#"<h1 class="post-title">Post</h1>{}"#, image),
    )
    .await;
    site.mount_error_page().await;
    site.mount_image_once().await;

    let exporter = site.exporter();
    let bundle = exporter.run().await.expect("export succeeds");

    let paths: Vec<&str> = bundle.paths().collect();
    assert_eq!(
        paths,
        vec![
            "404.html",
            "about.html",
            "blog/post-1.html",
            "index.html",
            "jquery.js",
            "sb_assets/img1.png",
            "script.js",
            "sitemap.xml",
            "style.css",
            "thanks.html",
        ]
    );

    // Shared assets are stored verbatim
    assert_eq!(text(&bundle, "style.css"), STYLESHEET);
    assert_eq!(text(&bundle, "jquery.js"), "/* jQuery */");
    assert_eq!(
        bundle.get("sb_assets/img1.png"),
        Some(&BundleFile::Binary(vec![0x89, 0x50, 0x4e, 0x47]))
    );
    assert_eq!(exporter.registry().len(), 1);

    // Generated sitemap honors the skip-from-sitemap marker
    let sitemap = text(&bundle, "sitemap.xml");
    assert!(sitemap.contains("<loc>https://www.example.com/</loc>"));
    assert!(sitemap.contains("<loc>https://www.example.com/about</loc>"));
    assert!(sitemap.contains("<loc>https://www.example.com/blog/post-1</loc>"));
    assert!(!sitemap.contains("thanks"));

    // Top-level page
    let about = text(&bundle, "about.html");
    assert!(about.contains(r#"src="./sb_assets/img1.png""#));
    assert!(about.contains(r#"<script src="./script.js" type="text/javascript"></script>"#));
    assert!(about.contains(r#"<script src="./jquery.js" type="text/javascript"></script>"#));
    assert!(about.contains("<html data-wf-site=\"1\">\n<head>"));
    assert!(!about.contains(&site.cdn.uri()));
    assert!(!about.contains(&site.lib.uri()));

    // Nested page points one level up and keeps only the rules it uses
    let post = text(&bundle, "blog/post-1.html");
    assert!(post.contains(r#"src="../sb_assets/img1.png""#));
    assert!(post.contains(r#"<script src="../script.js" type="text/javascript"></script>"#));
    assert!(post.contains(".post-title{font-size:2em}"));
    assert!(!post.contains(".hero{"));
    assert!(!post.contains(".unused"));

    // The home page reuses the fetched HTML and keeps its own rules
    let index = text(&bundle, "index.html");
    assert!(index.contains(".hero{color:red}"));
    assert!(index.contains(r#"<a href="/about">About</a>"#));

    // The error page is exported from its 404 response
    assert!(text(&bundle, "404.html").contains("<h1>Not found</h1>"));
}

#[tokio::test]
async fn test_export_with_upstream_sitemap() {
    let site = TestSite::start().await;

    let upstream = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>{dev}/</loc></url>
  <url><loc>{dev}/about</loc></url>
  <url><loc>{dev}/pricing/</loc></url>
</urlset>"#,
        dev = site.dev.uri()
    );
    mount_body(&site.dev, "/sitemap.xml", 200, &upstream).await;

    site.mount_page(
        "/",
        r#"<a href="/about">About</a>
           <a href="/careers" sb-skip-sitemap>Careers</a>
           <a href="/partners" sb-skip-fetch>Partners</a>"#,
    )
    .await;
    site.mount_page("/about", "<p>About</p>").await;
    site.mount_page("/pricing", "<p>Pricing</p>").await;
    site.mount_page("/careers", "<p>Careers</p>").await;
    site.mount_error_page().await;
    Mock::given(method("GET"))
        .and(path("/partners"))
        .respond_with(ResponseTemplate::new(200).set_body_string("never"))
        .expect(0)
        .mount(&site.dev)
        .await;

    let bundle = site.exporter().run().await.expect("export succeeds");

    assert!(bundle.contains("about.html"));
    assert!(bundle.contains("pricing.html"));
    assert!(bundle.contains("careers.html"));
    assert!(bundle.contains("404.html"));
    assert!(bundle.contains("index.html"));
    assert!(!bundle.contains("partners.html"));

    // Upstream sitemap is published with the dev host swapped textually
    assert_eq!(
        text(&bundle, "sitemap.xml"),
        upstream.replace(&site.dev.uri(), TARGET)
    );
}

#[tokio::test]
async fn test_export_fails_on_unreachable_asset() {
    let site = TestSite::start().await;
    // The library reference points at a path the library host does not serve
    let home = site
        .page("")
        .replace("jquery-3.5.1.min.js", "jquery-missing.js");
    mount_body(&site.dev, "/", 200, &home).await;

    let result = site.exporter().run().await;

    assert!(matches!(result, Err(BakeError::Fetch(_))));
}

#[tokio::test]
async fn test_export_from_config_and_materialize() {
    let site = TestSite::start().await;
    site.mount_page("/", r#"<a href="/docs/start">Start</a>"#).await;
    site.mount_page("/docs/start", "<p>Start here</p>").await;
    site.mount_error_page().await;

    let mut config = site.config();
    config.redirects = Some("/old /docs/start 301".to_string());
    config.headers = Some("/*\n  X-Frame-Options: DENY".to_string());

    let bundle = run_export(&config).await.expect("export succeeds");

    let dir = tempfile::TempDir::new().expect("temp dir");
    let root = dir.path().join("public");
    let written = DirectoryMaterializer::new(&root)
        .materialize(&bundle)
        .expect("bundle written");

    assert_eq!(written, bundle.len());
    assert_eq!(
        std::fs::read_to_string(root.join("_redirects")).unwrap(),
        "/old /docs/start 301"
    );
    assert_eq!(
        std::fs::read_to_string(root.join("_headers")).unwrap(),
        "/*\n  X-Frame-Options: DENY"
    );
    let nested = std::fs::read_to_string(root.join("docs/start.html")).unwrap();
    assert!(nested.contains(r#"<script src="../script.js" type="text/javascript"></script>"#));
    assert!(root.join("index.html").is_file());
    assert!(root.join("404.html").is_file());
    assert!(root.join("style.css").is_file());
}

#[tokio::test]
async fn test_missing_hosts_rejected_before_network() {
    let config = Config {
        site: String::new(),
        target_host: TARGET.to_string(),
        ..Config::default()
    };

    let result = run_export(&config).await;

    assert!(matches!(
        result,
        Err(BakeError::Config(flowbake::ConfigError::MissingField("site")))
    ));
}
