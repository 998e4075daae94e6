#![expect(missing_docs)]
#![cfg(feature = "serde")]

use textbridge::{Ownership, ProviderOptions};

#[test]
fn options_fill_missing_fields_from_defaults() {
    let options: ProviderOptions =
        serde_json::from_str(r#"{"chunk_units":64}"#).expect("valid options");
    assert_eq!(options.chunk_units, 64);
    assert_eq!(options.whole_text_limit, 1024);

    let json = serde_json::to_string(&ProviderOptions::default()).expect("serializable");
    insta::assert_snapshot!(json, @r#"{"chunk_units":256,"whole_text_limit":1024}"#);
}

#[test]
fn ownership_serializes_as_variant_names() {
    let json = serde_json::to_string(&[Ownership::Owning, Ownership::Borrowing, Ownership::MutableOwning])
        .expect("serializable");
    assert_eq!(json, r#"["Owning","Borrowing","MutableOwning"]"#);
    let back: Vec<Ownership> = serde_json::from_str(&json).expect("round trip");
    assert!(back[2].is_writable());
}
