//! Shared fixtures for the integration tests

use article_harvester::config::{parse_config, Config};
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration rooted at `base_url`, with all state in `dir`
pub fn create_test_config(base_url: &str, dir: &Path) -> Config {
    let host = url::Url::parse(base_url)
        .expect("Failed to parse base URL")
        .host_str()
        .expect("Failed to extract host")
        .to_string();

    parse_config(&format!(
        r#"
        [crawler]
        entry-url = "{base}/"
        allowed-domains = ["{host}"]
        fetch-timeout-secs = 5

        [user-agent]
        crawler-name = "TestBot"
        crawler-version = "1.0.0"

        [queue]
        database-path = "{dir}/queue.db"

        [ingest]
        threshold = 2
        output-dir = "{dir}/records"
        poll-interval-ms = 10

        [assets]
        image-dir = "{dir}/images"
        "#,
        base = base_url,
        host = host,
        dir = dir.display()
    ))
    .expect("test config should be valid")
}

/// Renders a page in the channel's article layout
pub fn article_html(title: &str, links: &[&str], images: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">link</a>"#, href))
        .collect();
    let imgs: String = images
        .iter()
        .map(|src| format!(r#"<img src="{}">"#, src))
        .collect();

    format!(
        r#"<html><body>
        <div class="channel"><div class="col-1-1">2021年06月01日08:21 | 来源：人民网</div></div>
        <div class="rm_txt"><div class="col-1"><h1>{title}</h1></div></div>
        <div class="col col-1"><div class="rm_txt_con cf"><p>{title} body</p>{imgs}</div></div>
        {anchors}
        </body></html>"#,
        title = title,
        imgs = imgs,
        anchors = anchors
    )
}

/// Renders an index page that only carries links
pub fn index_html(links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<li><a href="{}">link</a></li>"#, href))
        .collect();
    format!("<html><body><ul>{}</ul></body></html>", anchors)
}

/// Mounts an HTML page at `route`, expecting exactly `hits` GETs
pub async fn mount_page(server: &MockServer, route: &str, body: String, hits: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .expect(hits)
        .mount(server)
        .await;
}
