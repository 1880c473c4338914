use cwqso::qso::{Lexicon, TextAnalyzer};

fn analyze(text: &str, peer: Option<&str>) -> cwqso::qso::MessageAnalysis {
    TextAnalyzer::new(Lexicon::shared()).analyze(text, "F4BOT", peer)
}

#[test]
fn self_callsign_is_never_the_peer() {
    let a = analyze("F4BOT DE F4BOT", None);
    assert!(a.detected.has_self_callsign);
    assert!(!a.detected.has_callsign);
    assert_eq!(a.extracted.callsign, None);
    assert_eq!(a.extracted.all_callsigns, vec!["F4BOT".to_string()]);
}

#[test]
fn first_foreign_callsign_wins() {
    let a = analyze("f4bot de dl1abc dl1abc k1xx", None);
    assert_eq!(a.extracted.callsign.as_deref(), Some("DL1ABC"));
    assert_eq!(a.extracted.all_callsigns, vec!["F4BOT", "DL1ABC", "K1XX"]);
    assert!(a.detected.is_calling_self);
}

#[test]
fn configured_peer_flags() {
    let a = analyze("F4BOT DE F4ABC", Some("f4abc"));
    assert!(a.detected.has_configured_peer_callsign);
    assert!(a.detected.peer_callsign_matches_configured);
    assert!(!a.peer_mismatch(Some("F4ABC")));

    let b = analyze("F4BOT DE K1XX", Some("F4ABC"));
    assert!(!b.detected.has_configured_peer_callsign);
    assert!(b.peer_mismatch(Some("F4ABC")));
    assert!(!b.peer_mismatch(None));
}

#[test]
fn keywords_match_whole_tokens_only() {
    assert!(!analyze("CQX GMT", None).detected.is_cq);
    assert!(!analyze("GMT", None).detected.is_greeting);
    assert!(analyze("GM OM", None).detected.is_greeting);
    assert!(analyze("HW?", None).detected.is_question);
}

#[test]
fn report_fields_normalize() {
    let a = analyze("UR 5NN 5NN", None);
    assert!(a.detected.is_report);
    assert_eq!(a.extracted.rst.as_deref(), Some("599"));

    let b = analyze("RST 459 459 NAME IS PAUL QTH IN BERLIN", None);
    assert_eq!(b.extracted.rst.as_deref(), Some("459"));
    assert_eq!(b.extracted.name.as_deref(), Some("PAUL"));
    assert_eq!(b.extracted.qth.as_deref(), Some("BERLIN"));
    assert!(b.detected.has_name);
    assert!(b.detected.has_qth);
}

#[test]
fn closing_and_repeat() {
    let a = analyze("TNX FER QSO 73 SK", None);
    assert!(a.detected.is_closing);
    assert!(!a.detected.is_repeat_request);
    let b = analyze("PSE AGN", None);
    assert!(b.detected.is_repeat_request);
}

#[test]
fn blank_input_is_empty_analysis() {
    let a = analyze("   ", None);
    assert_eq!(a.normalized_text, "");
    assert!(a.words.is_empty());
    assert_eq!(a.detected, Default::default());
    assert_eq!(a.extracted, Default::default());
}
