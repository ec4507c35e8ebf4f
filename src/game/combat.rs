//! Combat system - attack table, hit detection and damage exchange

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::fighter::{Fighter, Side};
use super::physics::Arena;

/// Attack types a fighter can throw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackKind {
    Punch,
    Kick,
    Special,
}

impl AttackKind {
    pub const ALL: [AttackKind; 3] = [AttackKind::Punch, AttackKind::Kick, AttackKind::Special];
}

/// Attack stats per attack kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackStats {
    /// Total length of the attack in ticks
    pub duration: u32,
    /// Raw damage on an unblocked hit
    pub damage: f32,
    /// Horizontal velocity forced onto the defender
    pub knockback: f32,
    /// Hitbox offset below the fighter's top edge
    pub box_offset_y: f32,
    pub box_width: f32,
    pub box_height: f32,
    /// How far behind the fighter's left edge the box starts when facing left
    pub reach_back: f32,
}

impl AttackStats {
    pub fn for_kind(kind: AttackKind) -> Self {
        match kind {
            AttackKind::Punch => Self {
                duration: 15,
                damage: 8.0,
                knockback: 5.0,
                box_offset_y: 20.0,
                box_width: 50.0,
                box_height: 30.0,
                reach_back: 50.0,
            },
            AttackKind::Kick => Self {
                duration: 20,
                damage: 12.0,
                knockback: 8.0,
                box_offset_y: 50.0,
                box_width: 60.0,
                box_height: 40.0,
                reach_back: 50.0,
            },
            AttackKind::Special => Self {
                duration: 30,
                damage: 20.0,
                knockback: 15.0,
                box_offset_y: 10.0,
                box_width: 80.0,
                box_height: 60.0,
                reach_back: 80.0,
            },
        }
    }

    /// Active window is `[0.3 * duration, 0.6 * duration]`, inclusive on both ends.
    /// Integer arithmetic keeps the boundaries exact.
    pub fn is_active_frame(frame: u32, duration: u32) -> bool {
        let scaled = frame as u64 * 10;
        let duration = duration as u64;
        scaled >= duration * 3 && scaled <= duration * 6
    }
}

/// A hit that landed this tick
#[derive(Debug, Clone, PartialEq)]
pub struct HitResult {
    pub attacker: Side,
    pub defender: Side,
    pub attack: AttackKind,
    /// Health actually removed from the defender
    pub damage: f32,
    pub blocked: bool,
    pub defender_health: f32,
}

/// A pending hit measured before any damage of the tick is applied
#[derive(Debug, Clone, Copy)]
struct PendingHit {
    attack: AttackKind,
    damage: f32,
    knockback: f32,
}

/// Per-tick combat resolution for a pair of fighters
pub struct CombatResolver;

impl CombatResolver {
    /// Run one combat tick: face each other, integrate both fighters, then
    /// trade hits. Both attacks are measured before either lands, so a
    /// simultaneous trade damages both fighters.
    pub fn resolve(a: &mut Fighter, b: &mut Fighter, arena: &Arena) -> Vec<HitResult> {
        Self::update_facing(a, b);

        a.advance_tick(arena);
        b.advance_tick(arena);

        let a_hits = Self::measure_hit(a, b);
        let b_hits = Self::measure_hit(b, a);

        let mut hits = Vec::new();
        if let Some(pending) = a_hits {
            hits.extend(Self::apply_hit(a.side(), b, pending));
        }
        if let Some(pending) = b_hits {
            hits.extend(Self::apply_hit(b.side(), a, pending));
        }
        hits
    }

    /// Each fighter faces the other; ties put side `a` facing left.
    /// No hysteresis, so overlapping fighters may flip every tick.
    pub fn update_facing(a: &mut Fighter, b: &mut Fighter) {
        let a_left_of_b = a.x() < b.x();
        a.set_facing_right(a_left_of_b);
        b.set_facing_right(!a_left_of_b);
    }

    fn measure_hit(attacker: &Fighter, defender: &Fighter) -> Option<PendingHit> {
        if !attacker.is_attack_active() {
            return None;
        }
        let attack = attacker.attack_kind()?;
        let hitbox = attacker.attack_box()?;
        if !hitbox.overlaps(&defender.bounds()) {
            return None;
        }
        Some(PendingHit {
            attack,
            damage: Fighter::damage_for(attack),
            knockback: Fighter::knockback_for(attack, attacker.facing_right()),
        })
    }

    fn apply_hit(attacker: Side, defender: &mut Fighter, pending: PendingHit) -> Option<HitResult> {
        let health_before = defender.health();
        let blocked = defender.is_blocking();

        if !defender.take_damage(pending.damage, pending.knockback) {
            return None;
        }

        let result = HitResult {
            attacker,
            defender: defender.side(),
            attack: pending.attack,
            damage: health_before - defender.health(),
            blocked,
            defender_health: defender.health(),
        };

        debug!(
            attacker = ?result.attacker,
            attack = ?result.attack,
            damage = result.damage,
            blocked = result.blocked,
            defender_health = result.defender_health,
            "Hit landed"
        );

        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arena() -> Arena {
        Arena::new(800.0, 450.0, 400.0).unwrap()
    }

    /// Two grounded fighters `gap` pixels apart (left edges)
    fn pair(gap: f32) -> (Fighter, Fighter) {
        let mut a = Fighter::spawn(Side::One, 200.0, 300.0);
        let mut b = Fighter::spawn(Side::Two, 200.0 + gap, 300.0);
        CombatResolver::resolve(&mut a, &mut b, &arena());
        (a, b)
    }

    fn run(a: &mut Fighter, b: &mut Fighter, ticks: u32) -> Vec<HitResult> {
        let mut hits = Vec::new();
        for _ in 0..ticks {
            hits.extend(CombatResolver::resolve(a, b, &arena()));
        }
        hits
    }

    #[test]
    fn active_window_boundaries_for_every_kind() {
        for kind in AttackKind::ALL {
            let duration = AttackStats::for_kind(kind).duration;
            for frame in 0..=duration {
                let f = frame as f64;
                let d = duration as f64;
                let expected = f >= 0.3 * d && f <= 0.6 * d;
                assert_eq!(
                    AttackStats::is_active_frame(frame, duration),
                    expected,
                    "{kind:?} frame {frame}"
                );
            }
        }
        assert!(AttackStats::is_active_frame(6, 20));
        assert!(AttackStats::is_active_frame(12, 20));
        assert!(AttackStats::is_active_frame(9, 30));
        assert!(AttackStats::is_active_frame(18, 30));
        assert!(!AttackStats::is_active_frame(4, 15));
        assert!(AttackStats::is_active_frame(5, 15));
        assert!(AttackStats::is_active_frame(9, 15));
        assert!(!AttackStats::is_active_frame(10, 15));
    }

    #[test]
    fn fighters_face_each_other() {
        let (a, b) = pair(100.0);
        assert!(a.facing_right());
        assert!(!b.facing_right());

        let mut a = Fighter::spawn(Side::One, 500.0, 300.0);
        let mut b = Fighter::spawn(Side::Two, 100.0, 300.0);
        CombatResolver::update_facing(&mut a, &mut b);
        assert!(!a.facing_right());
        assert!(b.facing_right());
    }

    #[test]
    fn punch_in_range_lands_once() {
        let (mut a, mut b) = pair(80.0);
        a.punch();
        let hits = run(&mut a, &mut b, 15);

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].attacker, Side::One);
        assert_eq!(hits[0].defender, Side::Two);
        assert_eq!(hits[0].attack, AttackKind::Punch);
        assert_eq!(hits[0].damage, 8.0);
        assert!(!hits[0].blocked);
        assert_eq!(b.health(), 92.0);
    }

    #[test]
    fn punch_out_of_range_misses() {
        let (mut a, mut b) = pair(200.0);
        a.punch();
        assert!(run(&mut a, &mut b, 15).is_empty());
        assert_eq!(b.health(), b.max_health());
    }

    #[test]
    fn blocked_hit_reports_reduced_damage() {
        let (mut a, mut b) = pair(80.0);
        b.block(true);
        a.kick();
        let hits = run(&mut a, &mut b, 20);

        assert_eq!(hits.len(), 1);
        assert!(hits[0].blocked);
        assert!((hits[0].damage - 2.4).abs() < 1e-4);
        assert_eq!(b.hit_stun(), 0);
    }

    #[test]
    fn simultaneous_trade_hits_both() {
        let (mut a, mut b) = pair(80.0);
        a.punch();
        b.punch();
        let hits = run(&mut a, &mut b, 15);

        assert_eq!(hits.len(), 2);
        assert_eq!(a.health(), 92.0);
        assert_eq!(b.health(), 92.0);
    }

    #[test]
    fn knockback_points_away_from_attacker() {
        let (mut a, mut b) = pair(80.0);
        a.special();
        run(&mut a, &mut b, 10);
        assert!(b.is_hit());
        assert_eq!(b.velocity().0, 15.0);
    }
}
