//! Integration tests for header parsing and serialization.
//!
//! These exercise the public API end to end with header values as they
//! appear in real messages.

use mailmime::{
    ContentDisposition, ContentType, Error, HeaderCollection, ParameterList, ParameterizedHeader,
    Parser, ParserConfig,
};

#[test]
fn test_change_charset_round_trip() {
    let mut ct = ContentType::parse("text/html; charset=ISO-8859-1").unwrap();
    ct.set_charset_parameter("UTF-8").unwrap();
    assert_eq!(ct.to_string(), "text/html; charset=UTF-8");
}

#[test]
fn test_non_ascii_name_round_trip() {
    let mut ct = ContentType::parse("application/msword").unwrap();
    ct.set_name_parameter("résumé.doc").unwrap();
    let wire = ct.to_string();
    assert!(wire.is_ascii());

    let reparsed = ContentType::parse(&wire).unwrap();
    assert_eq!(reparsed.name_parameter(), Some("résumé.doc"));
    assert_eq!(reparsed, ct);
}

#[test]
fn test_default_subtypes() {
    assert_eq!(ContentType::parse("multipart/").unwrap().base_type(), "multipart/mixed");
    assert_eq!(ContentType::parse("text/").unwrap().base_type(), "text/plain");
}

#[test]
fn test_rfc2231_continuations_in_the_wild() {
    let raw = "application/pdf;\r\n \
               name*0*=UTF-8''%D0%9E%D1%82%D1%87%D0%B5%D1%82;\r\n \
               name*1*=%20%E2%84%961.pdf";
    let ct = ContentType::parse(raw).unwrap();
    assert_eq!(ct.base_type(), "application/pdf");
    assert_eq!(ct.name_parameter(), Some("Отчет №1.pdf"));

    let value = ct.parameters().get_value("name").unwrap();
    assert!(value.is_rfc2231());
    assert_eq!(value.charset(), Some("UTF-8"));
    assert_eq!(value.fragments().len(), 2);
}

#[test]
fn test_outlook_style_quoted_encoded_word() {
    let ct = ContentType::parse(
        "application/vnd.ms-excel; name=\"=?iso-8859-1?Q?Kosten=FCbersicht.xls?=\"",
    )
    .unwrap();
    assert_eq!(ct.name_parameter(), Some("Kostenübersicht.xls"));
}

#[test]
fn test_broken_headers_are_recovered() {
    let cases = [
        ("text/plain; charset=\"utf-8\";", "text/plain"),
        ("(text/html)", "text/html"),
        ("TEXT/PLAIN ; FORMAT=flowed", "TEXT/PLAIN"),
        ("text / plain", "text/plain"),
        ("\"application/pdf\"; name=a.pdf", "application/pdf"),
        ("=?us-ascii?Q?image/png?=", "image/png"),
        ("image/jpeg, image/png", "image/jpeg"),
    ];
    for (input, expected) in cases {
        let ct = ContentType::parse(input).unwrap();
        assert_eq!(ct.base_type(), expected, "input: {input}");
    }
}

#[test]
fn test_unquoted_whitespace_in_value() {
    let cd = ContentDisposition::parse("attachment; filename=Annual Report 2024.pdf; size=1024")
        .unwrap();
    assert_eq!(cd.filename_parameter(), Some("Annual Report 2024.pdf"));
    assert_eq!(cd.get_parameter("size"), Some("1024"));
}

#[test]
fn test_trailing_comment_in_parameters() {
    let ct = ContentType::parse("text/plain; charset=us-ascii (Plain text)").unwrap();
    assert_eq!(ct.charset_parameter(), Some("us-ascii"));
}

#[test]
fn test_pathological_input_finishes() {
    let mut raw = String::from("text/plain; name=\"");
    raw.push_str(&"(".repeat(50_000));
    let ct = ContentType::parse(&raw).unwrap();
    assert_eq!(ct.base_type(), "text/plain");

    let raw = format!("text/plain;{}", "a=b;".repeat(10_000));
    let ct = ContentType::parse(&raw).unwrap();
    assert_eq!(ct.get_parameter("a"), Some("b"));
}

#[test]
fn test_parameters_serialize_sorted() {
    let ct = ContentType::parse("multipart/signed; protocol=\"application/pgp-signature\"; Micalg=pgp-sha256; boundary=abc")
        .unwrap();
    assert_eq!(
        ct.to_string(),
        "multipart/signed; boundary=abc; micalg=pgp-sha256; protocol=\"application/pgp-signature\""
    );
}

#[test]
fn test_default_shared_instance_is_read_only() {
    let shared = ContentType::default_text_plain();
    let mut copy = shared.clone();
    assert!(matches!(copy.set_charset_parameter("utf-8"), Err(Error::ReadOnly(_))));

    let mut fresh = ContentType::parse("").unwrap();
    fresh.set_charset_parameter("utf-8").unwrap();
    assert_eq!(shared.charset_parameter(), Some("us-ascii"));
}

#[test]
fn test_parser_reload_switches_mode() {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    let strict = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&strict);
    let mut parser = Parser::new(move || {
        if flag.load(Ordering::SeqCst) {
            ParserConfig::strict()
        } else {
            ParserConfig::default()
        }
    });

    assert!(parser.content_type("te xt/plain").is_ok());
    strict.store(true, Ordering::SeqCst);
    assert!(parser.content_type("te xt/plain").is_ok());
    parser.reload();
    assert!(parser.content_type("te xt/plain").is_err());
    assert!(parser.content_disposition("in line").is_err());
}

#[test]
fn test_header_collection_end_to_end() {
    let raw = concat!(
        "Content-Type: multipart/mixed;\r\n",
        "\tboundary=\"----=_NextPart_000\"\r\n",
        "Content-Disposition: attachment;\r\n",
        " filename*=iso-8859-1'de'Gr%FC%DFe.txt\r\n",
        "\r\n",
    );
    let mut headers = HeaderCollection::parse(raw);
    let ct = headers.content_type().unwrap();
    assert_eq!(ct.boundary_parameter(), Some("----=_NextPart_000"));

    let mut cd = headers.content_disposition().unwrap().unwrap();
    assert_eq!(cd.filename_parameter(), Some("Grüße.txt"));

    cd.set_disposition("inline").unwrap();
    headers.set_content_disposition(&cd);
    let cd = headers.content_disposition().unwrap().unwrap();
    assert!(cd.is_inline());
    assert_eq!(cd.filename_parameter(), Some("Grüße.txt"));
}

#[test]
fn test_parameter_list_standalone() {
    let mut list = ParameterList::parse("; a=1; B=\"two words\"");
    list.add("c", "x").unwrap();
    assert_eq!(list.to_string(), "; a=1; b=\"two words\"; c=x");
}

#[test]
fn test_added_fragment_outside_declared_charset_stays_ascii() {
    let mut ct = ContentType::parse("application/x; name*=iso-8859-1''%E9").unwrap();
    ct.add_parameter("name", "日本").unwrap();
    let wire = ct.to_string();
    assert!(wire.is_ascii(), "{wire}");
    assert_eq!(ContentType::parse(&wire).unwrap().name_parameter(), Some("é日本"));
}

#[test]
fn test_huge_continuation_index_is_ignored() {
    let ct = ContentType::parse("text/plain; name*18446744073709551615=x; name*20000000=y")
        .unwrap();
    assert_eq!(ct.base_type(), "text/plain");
    assert!(!ct.contains_name_parameter());
}

#[test]
fn test_percent_encoded_slash_is_not_replaced_by_name() {
    let ct = ContentType::parse("\"text%2Fhtml\"; name=report.pdf").unwrap();
    assert_eq!(ct.base_type(), "text/html");
}
