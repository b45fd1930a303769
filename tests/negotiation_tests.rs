use liberator_friend::resource::negotiate::{AcceptHeader, MediaType, select_media_type};

fn accept(raw: &str) -> AcceptHeader {
    AcceptHeader::new(Some(raw))
}

fn mt(raw: &str) -> MediaType {
    MediaType::parse(raw).unwrap()
}

#[test]
fn test_parse_media_type() {
    let media = mt("Text/HTML; charset=utf-8");
    assert_eq!(media.kind(), "text");
    assert_eq!(media.subtype(), "html");
    assert_eq!(media.essence(), "text/html");

    assert!(MediaType::parse("texthtml").is_none());
    assert!(MediaType::parse("text/").is_none());
    assert!(MediaType::parse("*/json").is_none());
}

#[test]
fn test_preferences_ordered_by_quality_then_specificity() {
    let prefs = accept("*/*;q=0.1, text/*, application/json;q=0.9, text/html").preferences();
    assert_eq!(
        prefs,
        vec![mt("text/html"), mt("text/*"), mt("application/json"), mt("*/*")]
    );
}

#[test]
fn test_preferences_drop_refused_and_garbage_entries() {
    let prefs = accept("text/plain;q=0, nonsense, application/json").preferences();
    assert_eq!(prefs, vec![mt("application/json")]);
}

#[test]
fn test_select_without_allowed_returns_top_preference() {
    let header = accept("text/xml, application/json;q=0.5");
    assert_eq!(select_media_type(Some(&header), None), Some(mt("text/xml")));
}

#[test]
fn test_select_missing_header_accepts_anything() {
    let missing = AcceptHeader::new(None);
    assert_eq!(select_media_type(Some(&missing), None), Some(MediaType::any()));

    let allowed = [MediaType::plain_text(), MediaType::json()];
    assert_eq!(
        select_media_type(Some(&missing), Some(&allowed[..])),
        Some(MediaType::plain_text())
    );
}

#[test]
fn test_select_with_allowed_picks_best_match() {
    let allowed = [MediaType::plain_text(), MediaType::json()];
    let header = accept("application/json, text/plain;q=0.5");
    assert_eq!(
        select_media_type(Some(&header), Some(&allowed[..])),
        Some(MediaType::json())
    );
}

#[test]
fn test_wildcards_match_in_both_directions() {
    // Accepted wildcard, concrete allowed type.
    let allowed = [MediaType::plain_text()];
    assert_eq!(
        select_media_type(Some(&accept("*/*")), Some(&allowed[..])),
        Some(MediaType::plain_text())
    );
    assert_eq!(
        select_media_type(Some(&accept("text/*")), Some(&allowed[..])),
        Some(MediaType::plain_text())
    );

    // Allowed wildcard, concrete accepted type: the concrete one is negotiated.
    let allowed = [mt("text/*")];
    assert_eq!(
        select_media_type(Some(&accept("text/plain")), Some(&allowed[..])),
        Some(MediaType::plain_text())
    );
}

#[test]
fn test_select_returns_none_when_nothing_matches() {
    let allowed = [MediaType::plain_text()];
    assert_eq!(
        select_media_type(Some(&accept("text/xml")), Some(&allowed[..])),
        None
    );
    assert_eq!(
        select_media_type(Some(&accept("application/json")), Some(&allowed[..])),
        None
    );
}

#[test]
fn test_select_is_idempotent() {
    let header = accept("application/json;q=0.8, text/*;q=0.8, */*;q=0.1");
    let allowed = [MediaType::html(), MediaType::json(), MediaType::plain_text()];

    let first = select_media_type(Some(&header), Some(&allowed[..]));
    let second = select_media_type(Some(&header), Some(&allowed[..]));
    assert_eq!(first, second);
    // Equal quality: the more specific application/json outranks text/*.
    assert_eq!(first, Some(MediaType::json()));
}

#[test]
#[should_panic(expected = "requires the accept layer")]
fn test_select_with_allowed_but_no_accept_representation_fails_fast() {
    let allowed = [MediaType::plain_text()];
    let _ = select_media_type(None, Some(&allowed[..]));
}

#[test]
fn test_refused_type_is_not_rescued_by_a_wildcard() {
    let allowed = [MediaType::plain_text()];
    assert_eq!(
        select_media_type(Some(&accept("text/plain;q=0, */*")), Some(&allowed[..])),
        None
    );
    assert_eq!(
        select_media_type(Some(&accept("*/*, text/*;q=0")), Some(&allowed[..])),
        None
    );

    // Only the refused type drops out; others still match through the wildcard.
    let allowed = [MediaType::plain_text(), MediaType::json()];
    assert_eq!(
        select_media_type(Some(&accept("text/plain;q=0, */*")), Some(&allowed[..])),
        Some(MediaType::json())
    );
}

#[test]
fn test_most_specific_range_sets_the_quality() {
    let allowed = [MediaType::html(), MediaType::plain_text()];
    let header = accept("text/*;q=0.9, text/html;q=0.2");
    assert_eq!(
        select_media_type(Some(&header), Some(&allowed[..])),
        Some(MediaType::plain_text())
    );
}

#[test]
fn test_allowed_wildcard_skips_refused_concrete_types() {
    let allowed = [mt("text/*")];
    assert_eq!(
        select_media_type(Some(&accept("text/plain;q=0, text/html")), Some(&allowed[..])),
        Some(MediaType::html())
    );
    assert!(!MediaType::html().is_wildcard());
    assert!(mt("text/*").is_wildcard());
}

#[test]
fn test_select_without_allowed_ignores_refusals() {
    let header = accept("text/plain;q=0, application/json;q=0.5");
    assert_eq!(select_media_type(Some(&header), None), Some(MediaType::json()));
}
