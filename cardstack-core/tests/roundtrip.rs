use cardstack_core::{
    merge_import, Bundle, Card, CardId, DocType, Deck, Document, DocumentId, FieldType, FixedClock,
    Note, Package, Theme, WireDocument,
};
use chrono::{TimeZone, Utc};

fn clock() -> FixedClock {
    FixedClock(Utc.with_ymd_and_hms(2017, 1, 1, 0, 0, 0).unwrap())
}

#[test]
fn test_bundle_marshal_roundtrip() {
    let bundle = Bundle::new(
        DocumentId::new(DocType::Bundle, b"foo".to_vec()),
        DocumentId::new(DocType::User, b"bob".to_vec()),
        &clock(),
    )
    .unwrap();

    let json = bundle.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["_id"], "bundle-mzxw6");
    assert_eq!(value["owner"], "user-mjxwe");
    assert_eq!(value["type"], "bundle");

    let parsed = Bundle::from_json(&json).unwrap();
    assert_eq!(parsed.to_json().unwrap(), json);
}

fn build_package() -> Package {
    let bundle_id = DocumentId::new(DocType::Bundle, b"spanish".to_vec());
    let bundle = Bundle::new(
        bundle_id.clone(),
        DocumentId::new(DocType::User, b"bob".to_vec()),
        &clock(),
    )
    .unwrap()
    .with_name("Spanish");

    let mut theme = Theme::new(DocumentId::new(DocType::Theme, b"basic".to_vec()), &clock())
        .unwrap()
        .with_name("Basic");
    theme
        .files_mut()
        .add_file("style.css", "text/css", b"body {}".to_vec())
        .unwrap();
    let model = theme.new_model("standard", &clock());
    model.templates = vec!["front.html".to_string()];
    model.fields = vec![cardstack_core::Field::new(FieldType::Text, "Word")];
    let model_id = model.id();
    theme
        .model_files_mut(model_id)
        .unwrap()
        .add_file("front.html", "text/html", b"{{Word}}".to_vec())
        .unwrap();

    let note_id = DocumentId::new(DocType::Note, b"perro".to_vec());
    let mut note = Note::for_model(note_id.clone(), &theme, model_id, &clock()).unwrap();
    note.field_value_mut(0).unwrap().text = "perro".to_string();

    let card_id = CardId::for_note(&bundle_id, &note_id, 0).unwrap();
    let card = Card::new(card_id.clone(), &clock()).unwrap();

    let mut deck = Deck::new(DocumentId::new(DocType::Deck, b"animals".to_vec()), &clock())
        .unwrap()
        .with_name("Animals");
    deck.add_card(card_id);

    let mut package = Package::new();
    package.bundle = Some(bundle);
    package.themes.push(theme);
    package.notes.push(note);
    package.decks.push(deck);
    package.cards.push(card);
    package
}

#[test]
fn test_package_roundtrip_and_validate() {
    let package = build_package();
    package.validate().unwrap();

    let json = package.to_json().unwrap();
    let parsed = Package::from_json(&json).unwrap();
    parsed.validate().unwrap();
    assert_eq!(parsed, package);
    assert_eq!(parsed.to_json().unwrap(), json);

    let theme = &parsed.themes[0];
    assert!(theme.files().get_file("style.css").is_some());
    assert!(theme.model_files(0).unwrap().get_file("front.html").is_some());
    assert!(theme.model_files(0).unwrap().get_file("style.css").is_none());
}

#[test]
fn test_documents_dispatch_from_package() {
    let package = build_package();
    let note_json = package.notes[0].to_json().unwrap();
    let card_json = package.cards[0].to_json().unwrap();

    match Document::from_json(&note_json).unwrap() {
        Document::Note(note) => assert_eq!(note.theme().to_string(), "theme-YmFzaWM"),
        other => panic!("expected a note, got {:?}", other.doc_type()),
    }
    match Document::from_json(&card_json).unwrap() {
        Document::Card(card) => {
            assert_eq!(card.bundle_id().to_string(), "bundle-onygc3tjonua");
            assert_eq!(card.note_id().to_string(), "note-cGVycm8");
        }
        other => panic!("expected a card, got {:?}", other.doc_type()),
    }
}

#[test]
fn test_reimport_keeps_newer_copy() {
    let stored = {
        let mut package = build_package();
        let deck = &mut package.decks[0];
        deck.imported = Some(clock().0);
        deck.rev = Some("1-a".to_string());
        deck.clone()
    };

    let mut incoming = stored.clone();
    incoming.rev = None;
    incoming.name = Some("Animales".to_string());
    incoming.modified = incoming.modified + chrono::Duration::hours(1);

    assert!(merge_import(&mut incoming, &stored).unwrap());
    assert_eq!(incoming.name.as_deref(), Some("Animales"));
    assert_eq!(incoming.rev.as_deref(), Some("1-a"));
}
