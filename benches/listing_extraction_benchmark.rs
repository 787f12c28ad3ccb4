//! 목록 페이지 추출 성능 벤치마크
//!
//! - 한 페이지당 listing 수에 따른 추출 시간
//! - 가격 문자열 정규화 비용

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use catalog_scraper_lib::infrastructure::parsing::{ParseContext, ProductListParser, parse_price};

fn catalog_page(items: usize) -> String {
    let body: String = (0..items)
        .map(|i| {
            format!(
                r#"<li class="product">
                    <div class="mf-product-thumbnail"><img data-lazy-src="/wp-content/uploads/item-{i}.jpg" src="data:,"></div>
                    <h2 class="woo-loop-product__title"><a href="/product/item-{i}">Dental Item {i}</a></h2>
                    <span class="price"><span class="woocommerce-Price-amount amount"><bdi>₹{i},250.00</bdi></span></span>
                </li>"#
            )
        })
        .collect();
    format!(r#"<html><body><ul class="products columns-4">{body}</ul></body></html>"#)
}

fn listing_extraction(c: &mut Criterion) {
    let parser = ProductListParser::new().unwrap();
    let context = ParseContext::new(1, "https://dentalstall.com/shop/?page=1");

    let mut group = c.benchmark_group("listing_extraction");
    for items in [1usize, 24, 96] {
        let html = catalog_page(items);
        group.bench_with_input(BenchmarkId::from_parameter(items), &html, |b, html| {
            b.iter(|| parser.extract_listings(black_box(html), &context));
        });
    }
    group.finish();
}

fn price_normalization(c: &mut Criterion) {
    let symbols: Vec<String> = ["₹", "$", "€", "£", "¥"].iter().map(ToString::to_string).collect();
    c.bench_function("parse_price", |b| {
        b.iter(|| parse_price(black_box("₹ 12,345.00"), &symbols));
    });
}

criterion_group!(benches, listing_extraction, price_normalization);
criterion_main!(benches);
