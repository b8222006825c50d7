use std::time::Duration;

use quest_core::{
    Animation, CutscenePurpose, EngineConfig, EngineEvent, FailCause, ItemKind, LevelPack,
    PlaybackStop, Pos, Session,
};

const TICK: Duration = Duration::from_millis(300);

const CAMPAIGN: &str = r#"{
    "levels": [
        {
            "id": "meadow",
            "gridW": 4,
            "gridH": 4,
            "robot": { "x": 0, "y": 3 },
            "goal": { "x": 3, "y": 0 },
            "clear": { "logic": "AND", "conditions": [{ "id": "reach_goal", "type": "reach" }] }
        },
        {
            "id": "gatehouse",
            "gridW": 5,
            "gridH": 4,
            "robot": { "x": 0, "y": 0 },
            "goal": { "x": 4, "y": 0 },
            "cmdCap": 8,
            "repeatInnerCap": 3,
            "obstacles": [{ "x": 2, "y": 0, "type": "gate", "pass": "need_item", "item": "key" }],
            "pickups": [{ "type": "weapon", "x": 1, "y": 0 }],
            "enemies": [{ "type": "monster-b", "x": 1, "y": 1 }],
            "clear": {
                "logic": "AND",
                "conditions": [
                    { "id": "reach_goal", "type": "reach" },
                    { "id": "get_key", "type": "obtain", "item": "key",
                      "cutscenes": { "success": "battle-won.png" } }
                ]
            }
        }
    ]
}"#;

fn run_to_completion(session: &mut Session, ops: &[&str]) -> Vec<EngineEvent> {
    for op in ops {
        assert!(session.program_mut().press(op), "press {op} was rejected");
    }
    assert!(session.run());
    let mut events = Vec::new();
    for _ in 0..64 {
        let report = session.advance_time(TICK);
        events.extend(session.drain_events());
        if session.is_cutscene_playing() {
            session.finish_cutscene();
            events.extend(session.drain_events());
        }
        let done = matches!(
            report.stop_reason,
            PlaybackStop::Stopped | PlaybackStop::Finished | PlaybackStop::Idle
        );
        if done {
            break;
        }
    }
    events
}

#[test]
fn campaign_plays_through_both_missions() {
    let pack = LevelPack::from_json_str(CAMPAIGN).unwrap();
    let mut session = Session::new(pack, EngineConfig::default(), 2024).unwrap();
    session.drain_events();

    let first = run_to_completion(&mut session, &["→", "→", "→", "↑", "↑", "↑"]);
    assert_eq!(first.iter().filter(|e| matches!(e, EngineEvent::MissionCleared { .. })).count(), 1);
    assert_eq!(session.mission_index(), 1);
    assert_eq!(session.program().limits().command_cap, 8);

    // Down to the monster, back up with the key, then through the gate.
    let second = run_to_completion(
        &mut session,
        &["right", "down", "up", "repeat", "right", "end", "right"],
    );
    assert!(second.contains(&EngineEvent::ItemPicked { item: ItemKind::Weapon }));
    assert!(second.contains(&EngineEvent::EnemyDown { kind: "monster-b".to_string() }));
    assert!(second.contains(&EngineEvent::PlayCutscene {
        path: "battle-won.png".to_string(),
        purpose: CutscenePurpose::BattleWon,
    }));
    assert!(second.contains(&EngineEvent::GateChanged { pos: Pos { y: 0, x: 2 }, open: true }));
    assert!(second.contains(&EngineEvent::MissionCleared { index: 1 }));
    assert!(second.contains(&EngineEvent::CampaignComplete));
    assert_eq!(session.mission_index(), 0);
}

#[test]
fn gate_without_key_blocks_and_playback_finishes() {
    let pack = LevelPack::from_json_str(CAMPAIGN).unwrap();
    let mut session = Session::starting_at(pack, EngineConfig::default(), 7, 1).unwrap();
    session.drain_events();

    let events = run_to_completion(&mut session, &["right", "right", "right"]);
    assert!(events.contains(&EngineEvent::ItemPicked { item: ItemKind::Weapon }));
    let bumps = events
        .iter()
        .filter(|e| matches!(e, EngineEvent::PlayAnimation(Animation::Bump)))
        .count();
    assert_eq!(bumps, 2);
    assert_eq!(session.level().map(|level| level.actor()), Some(Pos { y: 0, x: 1 }));
    assert!(!events.iter().any(|e| matches!(e, EngineEvent::MissionFailed { .. })));
}

#[test]
fn walking_into_the_monster_unarmed_retries_the_mission() {
    let pack = LevelPack::from_json_str(CAMPAIGN).unwrap();
    let mut session = Session::starting_at(pack, EngineConfig::default(), 7, 1).unwrap();
    session.drain_events();

    let events = run_to_completion(&mut session, &["down", "right"]);
    assert!(events.contains(&EngineEvent::MissionFailed { cause: FailCause::CombatLost }));
    assert_eq!(session.attempt(), 1);
    assert_eq!(session.mission_index(), 1);
    assert_eq!(session.level().map(|level| level.actor()), Some(Pos { y: 0, x: 0 }));
}
