mod support;

use std::fs;
use std::path::PathBuf;

use rift_ingest::dto::{MatchDto, decode, decode_match};
use rift_ingest::error::DecodeError;
use rift_ingest::materializer::{game_record, participant_records};
use rift_ingest::model::{MatchId, Puuid};
use rift_ingest::reference::fetch_champions;

use support::{HOST, ScriptedTransport, build_api, test_config};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn fixture_value(name: &str) -> serde_json::Value {
    serde_json::from_str(&read_fixture(name)).expect("fixture should be json")
}

#[test]
fn parses_match_detail_fixture() {
    let raw = read_fixture("match_detail.json");
    let detail = decode_match(raw.as_bytes()).expect("fixture should decode");

    assert_eq!(detail.match_id(), &MatchId::from("EUW1_6240000001"));
    assert_eq!(detail.info.game_creation, 1_674_391_814_401);
    assert_eq!(detail.info.participants.len(), 10);
    assert_eq!(detail.participant_puuids().len(), 10);
    assert_eq!(detail.team_win(100), Some(false));
    assert_eq!(detail.team_win(200), Some(true));
    assert!(detail.participant_puuids().contains(&Puuid::from("puuid-j")));
}

#[test]
fn fixture_materializes_to_flat_records() {
    let raw = read_fixture("match_detail.json");
    let detail = decode_match(raw.as_bytes()).expect("fixture should decode");

    let game = game_record(&detail, true);
    assert!(game.potential_t0);
    assert!(game.team200_win);
    assert!(!game.team100_win);
    assert!(game.game_ended_in_surrender);
    assert_eq!(game.queue_id, 420);

    let rows = participant_records(&detail);
    assert_eq!(rows.len(), 10);
    let utility = rows
        .iter()
        .find(|r| r.puuid == Puuid::from("puuid-e"))
        .expect("utility row");
    assert_eq!(utility.individual_position, "UTILITY");
    assert_eq!(utility.champion_id, 412);
    assert_eq!(utility.team_id, 100);
    assert!(!utility.win);
}

#[test]
fn match_ids_fixture_keeps_newest_first_order() {
    let raw = read_fixture("match_ids.json");
    let ids: Vec<MatchId> = decode("match ids", raw.as_bytes()).expect("ids decode");
    assert_eq!(ids.first(), Some(&MatchId::from("EUW1_6240000009")));
    assert_eq!(ids.last(), Some(&MatchId::from("EUW1_6240000001")));
}

#[test]
fn rejects_match_missing_a_team() {
    let mut value = fixture_value("match_detail.json");
    value["info"]["teams"]
        .as_array_mut()
        .expect("teams array")
        .pop();
    let err = decode_match(value.to_string().as_bytes()).unwrap_err();
    assert!(matches!(err, DecodeError::Invalid { .. }), "{err}");
}

#[test]
fn rejects_participant_absent_from_metadata() {
    let mut value = fixture_value("match_detail.json");
    value["info"]["participants"][3]["puuid"] = serde_json::json!("puuid-stray");
    let err = decode_match(value.to_string().as_bytes()).unwrap_err();
    assert!(err.to_string().contains("puuid-stray"), "{err}");
}

#[test]
fn string_booleans_are_a_decode_error() {
    let mut value = fixture_value("match_detail.json");
    value["info"]["participants"][0]["win"] = serde_json::json!("true");
    let err = decode_match(value.to_string().as_bytes()).unwrap_err();
    assert!(matches!(err, DecodeError::Json { .. }), "{err}");
}

#[test]
fn missing_required_field_is_a_decode_error() {
    let mut value = fixture_value("match_detail.json");
    value["info"]
        .as_object_mut()
        .expect("info object")
        .remove("gameCreation");
    assert!(decode::<MatchDto>("match detail", value.to_string().as_bytes()).is_err());
}

#[test]
fn champion_fixture_becomes_sorted_records() {
    let config = test_config();
    let transport = ScriptedTransport::new();
    transport.always(
        &format!("{HOST}/ddragon/versions.json"),
        200,
        r#"["13.1.1","13.0.1"]"#,
    );
    transport.always(
        &format!("{HOST}/ddragon/13.1.1/champion.json"),
        200,
        read_fixture("champion.json"),
    );
    let api = build_api(&config, &transport);

    let champions = fetch_champions(&api).expect("champion data");

    let names: Vec<&str> = champions.iter().map(|c| c.champion_name.as_str()).collect();
    assert_eq!(names, vec!["Aatrox", "Ahri", "Wukong"]);
    let wukong = &champions[2];
    assert_eq!(wukong.champion_id, 62);
    assert_eq!(wukong.champion_key, "MonkeyKing");
    assert_eq!(wukong.tags, "Fighter,Tank");
    assert_eq!(wukong.version, "13.1.1");
}

#[test]
fn champion_load_fails_without_versions() {
    let config = test_config();
    let transport = ScriptedTransport::new();
    let api = build_api(&config, &transport);
    assert!(fetch_champions(&api).is_err());
}
