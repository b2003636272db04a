//! Payload locator strategies and validation.

use vr180_sbs::stereo::{accept_candidate, decode_payload, locate_payload, LocatorConfig, Strategy};

fn payload(len: usize) -> String {
    "QUJD".repeat(len / 4)
}

fn locate(xmp: &str) -> Option<(Strategy, String)> {
    locate_payload(xmp, &LocatorConfig::default()).map(|p| (p.strategy, p.base64))
}

#[test]
fn attribute_form() {
    let p = payload(1200);
    let xmp = format!(r#"<rdf:Description GImage:Mime="image/jpeg" GImage:Data="{p}"/>"#);
    assert_eq!(locate(&xmp), Some((Strategy::Attribute, p)));
}

#[test]
fn element_form() {
    let p = payload(1600);
    let xmp = format!("<rdf:Description><GImage:Data>{p}</GImage:Data></rdf:Description>");
    assert_eq!(locate(&xmp), Some((Strategy::Element, p)));
}

#[test]
fn renamed_prefix_found_through_namespace() {
    let p = payload(2000);
    let xmp = format!(
        r#"<rdf:Description xmlns:ns1="http://ns.google.com/photos/1.0/image/" ns1:Data="{p}"/>"#
    );
    assert_eq!(locate(&xmp), Some((Strategy::NamespacedAttribute, p)));
}

#[test]
fn namespace_without_vendor_token_is_ignored() {
    let p = payload(2000);
    let xmp = format!(r#"<rdf:Description xmlns:ns1="http://example.com/image/" ns1:Data="{p}"/>"#);
    assert_eq!(locate(&xmp), None);
}

#[test]
fn loose_form_with_attributes_on_element() {
    let p = payload(1400);
    let xmp = format!("<GImage:Data rdf:parseType=\"Literal\">\n{p}\n</GImage:Data>");
    assert_eq!(locate(&xmp), Some((Strategy::Loose, p)));
}

#[test]
fn scan_fallback_for_unterminated_attribute() {
    let p = payload(1200);
    // Value runs into the end of a truncated packet: no closing quote, no tags.
    let xmp = format!("GImage:Data=\"{p}");
    assert_eq!(locate(&xmp), Some((Strategy::Scan, p)));
}

#[test]
fn short_payload_is_rejected_by_every_strategy() {
    let xmp = format!(r#"<x GImage:Data="{}"/>"#, "A".repeat(500));
    assert_eq!(locate(&xmp), None);
}

#[test]
fn well_formed_but_short_candidate_is_rejected() {
    let short = payload(996);
    assert!(accept_candidate(&short, 1000).is_none());
    assert!(decode_payload(&short).is_ok());
}

#[test]
fn pretty_printed_payload_decodes_like_stripped() {
    let p = payload(3000);
    let wrapped: String = p
        .as_bytes()
        .chunks(76)
        .map(|c| format!("\n      {}", std::str::from_utf8(c).unwrap()))
        .collect();
    let xmp = format!(r#"<x GImage:Data="{wrapped}
    "/>"#);
    let (_, found) = locate(&xmp).unwrap();
    assert_eq!(found, p);
    assert_eq!(decode_payload(&found).unwrap(), decode_payload(&p).unwrap());
}

#[test]
fn non_base64_attribute_falls_through_to_later_strategy() {
    let p = payload(1200);
    let xmp = format!(
        r#"<x GImage:Data="{}*"/><GImage:Data>{p}</GImage:Data>"#,
        payload(1200)
    );
    assert_eq!(locate(&xmp), Some((Strategy::Element, p)));
}

#[test]
fn configurable_floor_and_key() {
    let config = LocatorConfig::default()
        .with_key("Cam:Right")
        .with_min_payload_len(8);
    let found = locate_payload(r#"<x Cam:Right="QUJDQUJDQUJD"/>"#, &config).unwrap();
    assert_eq!(found.base64, "QUJDQUJDQUJD");
}

#[test]
fn sibling_google_namespaces_are_not_the_payload() {
    let image = "SU1H".repeat(400);
    let xmp = format!(
        concat!(
            r#"<rdf:Description xmlns:GImage="http://ns.google.com/photos/1.0/image/" "#,
            r#"xmlns:GAudio="http://ns.google.com/photos/1.0/audio/" "#,
            r#"xmlns:GDepth="http://ns.google.com/photos/1.0/depthmap/" "#,
            r#"GAudio:Data="{audio}" GDepth:Data="{depth}">"#,
            r#"<GImage:Data rdf:parseType="Literal">{image}</GImage:Data>"#,
            "</rdf:Description>"
        ),
        audio = "QVVE".repeat(400),
        depth = "REVQ".repeat(400),
        image = image,
    );
    assert_eq!(locate(&xmp), Some((Strategy::Loose, image)));
}

#[test]
fn depth_only_photo_has_no_payload() {
    let xmp = format!(
        r#"<rdf:Description xmlns:GDepth="http://ns.google.com/photos/1.0/depthmap/" GDepth:Data="{}"/>"#,
        "REVQ".repeat(400)
    );
    assert_eq!(locate(&xmp), None);
}

#[test]
fn loose_form_ignores_longer_names() {
    let p = payload(1200);
    let xmp = format!("<GImage:DataX a=\"1\">{}</GImage:DataX>", payload(1600));
    let config = LocatorConfig::default().with_strategies(vec![Strategy::Loose]);
    assert!(locate_payload(&xmp, &config).is_none());

    let xmp = format!("{xmp}<GImage:Data a=\"1\">{p}</GImage:Data>");
    assert_eq!(locate_payload(&xmp, &config).map(|f| f.base64), Some(p));
}

#[test]
fn trailing_newlines_count_towards_floor() {
    let p = "A".repeat(1000);
    let xmp = format!("<x GImage:Data=\"{p}\n\n\"/>");
    assert_eq!(locate(&xmp), Some((Strategy::Attribute, p)));
}
