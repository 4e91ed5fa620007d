mod support;

use folio::application::sitemap::robots_txt;
use insta::assert_snapshot;
use support::site;

#[test]
fn robots_txt_layout() {
    assert_snapshot!(robots_txt(&site()), @r"
    User-agent: *
    Allow: /
    Disallow: /api/
    Disallow: /_next/
    Disallow: /admin/
    Disallow: /*.json$
    Disallow: /private/

    User-agent: Googlebot
    Allow: /blog
    Allow: /blog/
    Allow: /blog/*
    Crawl-delay: 1

    User-agent: Bingbot
    Allow: /blog
    Allow: /blog/
    Allow: /blog/*
    Crawl-delay: 1

    Host: https://folio.test

    Sitemap: https://folio.test/sitemap.xml
    Sitemap: https://folio.test/blog/sitemap.xml
    Sitemap: https://folio.test/rss.xml
    ");
}
