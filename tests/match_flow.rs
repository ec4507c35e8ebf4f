use pixel_brawl::game::{
    Arena, GameEvent, MatchController, MatchMode, MatchPhase, MatchRules, Side,
};
use pixel_brawl::game::{AiPolicy, Difficulty};
use pixel_brawl::input::Intent;

fn arena() -> Arena {
    Arena::new(800.0, 450.0, 400.0).unwrap()
}

fn versus() -> MatchController {
    let mut c = MatchController::new(
        MatchRules::default(),
        arena(),
        AiPolicy::seeded(Difficulty::Medium, 3),
    )
    .unwrap();
    c.start_game(MatchMode::Versus);
    c
}

/// Side one walks up to side two and punches until the round ends
fn win_round_with_punches(c: &mut MatchController) -> Vec<GameEvent> {
    let mut events = Vec::new();
    for _ in 0..3000 {
        let one = if c.fighter(Side::One).x() < 480.0 {
            Intent {
                right: true,
                ..Intent::default()
            }
        } else {
            Intent {
                punch: true,
                ..Intent::default()
            }
        };
        events.extend(c.tick([one, Intent::default()], arena()));
        if c.phase() != MatchPhase::Playing {
            return events;
        }
    }
    panic!("round never ended");
}

fn idle_until(c: &mut MatchController, phase: MatchPhase) -> Vec<GameEvent> {
    let mut events = Vec::new();
    for _ in 0..500 {
        if c.phase() == phase {
            return events;
        }
        events.extend(c.tick([Intent::default(); 2], arena()));
    }
    panic!("never reached {phase:?}");
}

#[test]
fn punches_win_the_round_for_side_one() {
    let mut c = versus();
    let events = win_round_with_punches(&mut c);

    assert_eq!(c.phase(), MatchPhase::RoundEnd);
    assert_eq!(c.p1_wins(), 1);
    assert_eq!(c.p2_wins(), 0);
    assert!(c.fighter(Side::Two).is_knocked_out());
    assert_eq!(c.fighter(Side::One).health(), 100.0);

    let hits = events
        .iter()
        .filter(|e| matches!(e, GameEvent::Hit { attacker: Side::One, .. }))
        .count();
    assert_eq!(hits, 13);
    assert!(events.iter().any(|e| matches!(
        e,
        GameEvent::KnockOut {
            winner: Side::One,
            decisive: false,
            ..
        }
    )));
    assert_eq!(c.announcement().map(|a| a.text.as_str()), Some("K.O.!"));
}

#[test]
fn no_input_lands_during_round_start_freeze() {
    let mut c = versus();
    for _ in 0..89 {
        let events = c.tick(
            [
                Intent {
                    right: true,
                    punch: true,
                    ..Intent::default()
                },
                Intent::default(),
            ],
            arena(),
        );
        assert!(events.iter().all(|e| !matches!(e, GameEvent::Hit { .. })));
        assert!(c.is_frozen());
    }
    assert_eq!(c.fighter(Side::One).x(), 160.0);
    assert!(!c.fighter(Side::One).is_attacking());
}

#[test]
fn two_round_wins_end_the_match() {
    let mut c = versus();

    win_round_with_punches(&mut c);
    idle_until(&mut c, MatchPhase::Playing);
    assert_eq!(c.round(), 2);
    assert_eq!(c.fighter(Side::Two).health(), 100.0);
    assert_eq!(c.fighter(Side::One).x(), 160.0);

    win_round_with_punches(&mut c);
    assert_eq!(c.p1_wins(), 2);
    assert_eq!(c.winner(), Some(Side::One));
    assert_eq!(c.announcement().map(|a| a.text.as_str()), Some("BLAZE WINS!"));

    let events = idle_until(&mut c, MatchPhase::GameOver);
    assert!(c.announcement().is_none());

    let stats = events
        .iter()
        .find_map(|e| match e {
            GameEvent::MatchEnded {
                winner: Side::One,
                winner_name,
                stats,
            } if winner_name == "BLAZE" => Some(stats.clone()),
            _ => None,
        })
        .expect("match ended event");
    assert_eq!(stats.rounds_played, 2);
    assert_eq!(stats.fighters[0].hits_landed, 26);
    assert_eq!(stats.fighters[0].damage_dealt, 200.0);
    assert_eq!(stats.fighters[1].damage_taken, 200.0);
    assert_eq!(stats.fighters[1].hits_landed, 0);
}

#[test]
fn round_reset_keeps_record_but_menu_return_clears_it() {
    let mut c = versus();
    win_round_with_punches(&mut c);
    idle_until(&mut c, MatchPhase::Playing);

    c.reset_round();
    assert_eq!(c.p1_wins(), 1);
    assert_eq!(c.round(), 2);

    let events = c.abandon();
    assert_eq!(c.phase(), MatchPhase::Menu);
    assert_eq!((c.p1_wins(), c.p2_wins(), c.round()), (0, 0, 1));
    assert!(events.contains(&GameEvent::PhaseChanged {
        from: MatchPhase::Playing,
        to: MatchPhase::Menu
    }));

    // menu ignores intents entirely
    let x = c.fighter(Side::One).x();
    c.tick(
        [
            Intent {
                right: true,
                ..Intent::default()
            },
            Intent::default(),
        ],
        arena(),
    );
    assert_eq!(c.fighter(Side::One).x(), x);
}

#[test]
fn blocked_punches_chip_a_fifth() {
    let mut c = versus();
    let mut events = Vec::new();
    for _ in 0..400 {
        let one = if c.fighter(Side::One).x() < 480.0 {
            Intent {
                right: true,
                ..Intent::default()
            }
        } else {
            Intent {
                punch: true,
                ..Intent::default()
            }
        };
        let two = Intent {
            block: true,
            ..Intent::default()
        };
        events.extend(c.tick([one, two], arena()));
    }

    let blocked: Vec<f32> = events
        .iter()
        .filter_map(|e| match e {
            GameEvent::Hit {
                blocked: true,
                damage,
                ..
            } => Some(*damage),
            _ => None,
        })
        .collect();
    assert!(!blocked.is_empty());
    for damage in &blocked {
        assert!((damage - 1.6).abs() < 1e-4);
    }
    assert_eq!(c.stats(Side::Two).hits_blocked as usize, blocked.len());
    assert_eq!(c.fighter(Side::Two).hit_stun(), 0);
}

#[test]
fn walls_stop_fighters_exactly() {
    let rules = MatchRules {
        round_start_delay: 0,
        ..MatchRules::default()
    };
    let mut c = MatchController::new(rules, arena(), AiPolicy::seeded(Difficulty::Easy, 9))
        .unwrap();
    c.start_game(MatchMode::Versus);

    let left = Intent {
        left: true,
        ..Intent::default()
    };
    let right = Intent {
        right: true,
        ..Intent::default()
    };
    for _ in 0..300 {
        c.tick([left, right], arena());
    }
    assert_eq!(c.fighter(Side::One).x(), 0.0);
    assert_eq!(c.fighter(Side::Two).x(), 800.0 - 60.0);

    // a narrower arena next tick pulls the fighter back inside
    let narrow = Arena::new(600.0, 450.0, 400.0).unwrap();
    c.tick([left, right], narrow);
    assert_eq!(c.fighter(Side::Two).x(), 600.0 - 60.0);
}
