//! Combat Resolver
//!
//! God abilities that strike invaders in an area, and the melee invaders
//! inflict on natives they catch.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use bevy_ecs::prelude::*;
use tracing::{debug, info};

use island_events::{GameEvent, PopulationKind, RemovalCause};

use crate::components::world::{ISLAND_CENTER, ISLAND_RADIUS};
use crate::components::{EntityId, Vec2};
use crate::context::SimContext;
use crate::error::SimError;

/// Melee tuning
pub mod combat_constants {
    /// Invaders this close to a native wound it
    pub const MELEE_RADIUS: f32 = 20.0;
    /// Happiness lost per melee round
    pub const MELEE_HAPPINESS_DAMAGE: f32 = 10.0;
    /// Seconds between melee rounds
    pub const MELEE_INTERVAL: f32 = 1.0;
    /// Extra losses when a true believer is killed
    pub const MARTYR_FAITH_LOSS: f32 = 10.0;
    pub const MARTYR_HEART_LOSS: i64 = 1;
}

use combat_constants::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbilityKind {
    SinkLand,
    Lightning,
    Earthquake,
}

/// Where an ability lands
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Targeting {
    /// Centered on the point the player picked
    Point,
    /// Centered on the island regardless of the pick
    Island,
}

/// Slow applied to every invader an ability touches
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slow {
    pub factor: f32,
    pub secs: f32,
}

#[derive(Debug)]
pub struct AbilityDef {
    pub key: &'static str,
    pub name: &'static str,
    pub mana_cost: f32,
    pub cooldown: f32,
    pub targeting: Targeting,
    pub radius: f32,
    pub damage: f32,
    pub slow: Option<Slow>,
    /// Happiness every native loses as collateral
    pub native_happiness: f32,
    /// How long a marker stays on the map afterwards
    pub linger: Option<f32>,
    /// Verb in the combat report, e.g. "Lightning Strike hit 2 invaders"
    pub verb: &'static str,
}

static ABILITIES: [AbilityDef; 3] = [
    AbilityDef {
        key: "sinkLand",
        name: "Sink Land",
        mana_cost: 20.0,
        cooldown: 15.0,
        targeting: Targeting::Point,
        radius: 50.0,
        damage: 20.0,
        slow: Some(Slow {
            factor: 0.5,
            secs: 5.0,
        }),
        native_happiness: 0.0,
        linger: Some(5.0),
        verb: "affected",
    },
    AbilityDef {
        key: "lightning",
        name: "Lightning Strike",
        mana_cost: 30.0,
        cooldown: 20.0,
        targeting: Targeting::Point,
        radius: 70.0,
        damage: 40.0,
        slow: None,
        native_happiness: 0.0,
        linger: None,
        verb: "hit",
    },
    AbilityDef {
        key: "earthquake",
        name: "Earthquake",
        mana_cost: 45.0,
        cooldown: 30.0,
        targeting: Targeting::Island,
        radius: ISLAND_RADIUS,
        damage: 30.0,
        slow: Some(Slow {
            factor: 0.7,
            secs: 3.0,
        }),
        native_happiness: -5.0,
        linger: Some(5.0),
        verb: "affected",
    },
];

impl AbilityKind {
    pub const ALL: [AbilityKind; 3] = [Self::SinkLand, Self::Lightning, Self::Earthquake];

    pub fn definition(self) -> &'static AbilityDef {
        &ABILITIES[self as usize]
    }

    pub fn as_str(self) -> &'static str {
        self.definition().key
    }
}

impl fmt::Display for AbilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.definition().name)
    }
}

impl FromStr for AbilityKind {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| SimError::unknown("ability", s))
    }
}

/// A spent ability's marker on the map
#[derive(Debug, Clone, PartialEq)]
pub struct ActiveEffect {
    pub kind: AbilityKind,
    pub position: Vec2,
    pub radius: f32,
    pub time_remaining: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AbilityReport {
    pub kind: AbilityKind,
    pub affected: usize,
    pub slain: Vec<EntityId>,
}

#[derive(Resource, Debug, Default)]
pub struct CombatSystem {
    cooldowns: HashMap<AbilityKind, f32>,
    effects: Vec<ActiveEffect>,
    melee_clock: f32,
}

impl CombatSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds until `kind` can be used again
    pub fn cooldown(&self, kind: AbilityKind) -> f32 {
        self.cooldowns.get(&kind).copied().unwrap_or(0.0)
    }

    pub fn active_effects(&self) -> &[ActiveEffect] {
        &self.effects
    }

    /// Spend mana and unleash an ability at `(x, y)`. Rejections leave
    /// everything untouched.
    pub fn use_ability(
        &mut self,
        kind: AbilityKind,
        x: f32,
        y: f32,
        ctx: &mut SimContext<'_>,
    ) -> Result<AbilityReport, SimError> {
        let def = kind.definition();
        let remaining = self.cooldown(kind);
        if remaining > 0.0 {
            return Err(SimError::OnCooldown {
                ability: def.key,
                remaining,
            });
        }
        ctx.ledger.spend_mana(def.mana_cost)?;
        self.cooldowns.insert(kind, def.cooldown);

        let center = match def.targeting {
            Targeting::Point => Vec2::new(x, y),
            Targeting::Island => ISLAND_CENTER,
        };

        let targets: Vec<EntityId> = ctx
            .population
            .invaders()
            .iter()
            .filter(|i| i.health.is_some() && i.position().within(center, def.radius))
            .map(|i| i.id())
            .collect();

        let mut slain = Vec::new();
        for &id in &targets {
            if let Some(slow) = def.slow {
                ctx.population
                    .apply_movement_penalty(id, slow.factor, slow.secs);
            }
            if matches!(ctx.population.damage(id, def.damage), Some(h) if h <= 0.0)
                && ctx.population.remove_entity(
                    PopulationKind::Invader,
                    id,
                    RemovalCause::Slain,
                    ctx.notifications,
                )
            {
                slain.push(id);
            }
        }

        if def.native_happiness != 0.0 {
            for native in ctx.population.natives_mut() {
                native.adjust_happiness(def.native_happiness);
            }
        }

        if let Some(linger) = def.linger {
            self.effects.push(ActiveEffect {
                kind,
                position: center,
                radius: def.radius,
                time_remaining: linger,
            });
        }

        let result = format!("{} {} {} invaders", def.name, def.verb, targets.len());
        info!("{} ({} slain)", result, slain.len());
        ctx.notifications.emit(GameEvent::CombatResult { result });

        Ok(AbilityReport {
            kind,
            affected: targets.len(),
            slain,
        })
    }

    /// Tick cooldowns and markers, and let invaders wound natives they reach
    pub fn update(&mut self, dt: f32, ctx: &mut SimContext<'_>) {
        for remaining in self.cooldowns.values_mut() {
            *remaining = (*remaining - dt).max(0.0);
        }

        for effect in &mut self.effects {
            effect.time_remaining -= dt;
        }
        self.effects.retain(|e| e.time_remaining > 0.0);

        self.melee_clock += dt;
        while self.melee_clock >= MELEE_INTERVAL {
            self.melee_clock -= MELEE_INTERVAL;
            process_invader_attacks(ctx);
        }
    }
}

/// One melee round: every invader wounds every native within reach. Natives
/// with no happiness left die, and true believers take faith and a heart with
/// them.
pub fn process_invader_attacks(ctx: &mut SimContext<'_>) -> Vec<EntityId> {
    let attackers: Vec<Vec2> = ctx
        .population
        .invaders()
        .iter()
        .map(|i| i.position())
        .collect();
    if attackers.is_empty() {
        return Vec::new();
    }

    let mut fallen = Vec::new();
    for native in ctx.population.natives_mut() {
        let hits = attackers
            .iter()
            .filter(|a| a.within(native.position(), MELEE_RADIUS))
            .count();
        if hits == 0 {
            continue;
        }
        native.adjust_happiness(-MELEE_HAPPINESS_DAMAGE * hits as f32);
        if native.happiness <= 0.0 {
            fallen.push((native.id(), native.is_true_believer));
        }
    }

    let mut slain = Vec::new();
    for (id, true_believer) in fallen {
        if !ctx.population.remove_entity(
            PopulationKind::Native,
            id,
            RemovalCause::Slain,
            ctx.notifications,
        ) {
            continue;
        }
        debug!("native {} killed by invaders", id);
        if true_believer {
            ctx.ledger.add_faith(-MARTYR_FAITH_LOSS);
            ctx.ledger.add_hearts(-MARTYR_HEART_LOSS);
        }
        slain.push(id);
    }
    slain
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::GameState;
    use crate::events::Notifications;
    use crate::systems::population::PopulationRegistry;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    struct Fixture {
        ledger: GameState,
        population: PopulationRegistry,
        rng: SmallRng,
        notes: Notifications,
    }

    impl Fixture {
        fn new(mana: f32) -> Self {
            Self {
                ledger: GameState::new(50.0, mana, 0),
                population: PopulationRegistry::new(),
                rng: SmallRng::seed_from_u64(7),
                notes: Notifications::new(),
            }
        }

        fn ctx(&mut self) -> SimContext<'_> {
            SimContext::new(
                &mut self.ledger,
                &mut self.population,
                &mut self.rng,
                &mut self.notes,
            )
        }
    }

    #[test]
    fn test_lightning_hits_only_inside_radius() {
        let mut fx = Fixture::new(100.0);
        let near = fx.population.spawn_invader_at(Vec2::new(400.0, 300.0), &mut fx.notes);
        let edge = fx.population.spawn_invader_at(Vec2::new(469.0, 300.0), &mut fx.notes);
        let far = fx.population.spawn_invader_at(Vec2::new(470.0, 300.0), &mut fx.notes);

        let mut combat = CombatSystem::new();
        let report = combat
            .use_ability(AbilityKind::Lightning, 400.0, 300.0, &mut fx.ctx())
            .unwrap();

        assert_eq!(report.affected, 2);
        assert!(report.slain.is_empty());
        assert_eq!(fx.population.get(near).unwrap().health, Some(60.0));
        assert_eq!(fx.population.get(edge).unwrap().health, Some(60.0));
        assert_eq!(fx.population.get(far).unwrap().health, Some(100.0));
        assert_eq!(fx.ledger.mana(), 70.0);
        assert_eq!(combat.cooldown(AbilityKind::Lightning), 20.0);
        assert!(fx.notes.game_events().any(|e| *e
            == GameEvent::CombatResult {
                result: "Lightning Strike hit 2 invaders".to_string()
            }));
    }

    #[test]
    fn test_lightning_kills_wounded_invaders() {
        let mut fx = Fixture::new(100.0);
        let weak = fx.population.spawn_invader_at(Vec2::new(400.0, 300.0), &mut fx.notes);
        fx.population.spawn_invader_at(Vec2::new(410.0, 300.0), &mut fx.notes);
        fx.population.damage(weak, 70.0);

        let mut combat = CombatSystem::new();
        let report = combat
            .use_ability(AbilityKind::Lightning, 400.0, 300.0, &mut fx.ctx())
            .unwrap();
        assert_eq!(report.slain, vec![weak]);
        assert_eq!(fx.population.count(PopulationKind::Invader), 1);
    }

    #[test]
    fn test_cooldown_blocks_without_spending() {
        let mut fx = Fixture::new(100.0);
        let mut combat = CombatSystem::new();
        combat
            .use_ability(AbilityKind::SinkLand, 0.0, 0.0, &mut fx.ctx())
            .unwrap();
        let err = combat
            .use_ability(AbilityKind::SinkLand, 0.0, 0.0, &mut fx.ctx())
            .unwrap_err();
        assert!(matches!(err, SimError::OnCooldown { ability: "sinkLand", .. }));
        assert_eq!(fx.ledger.mana(), 80.0);

        combat.update(15.0, &mut fx.ctx());
        assert_eq!(combat.cooldown(AbilityKind::SinkLand), 0.0);
        assert!(combat
            .use_ability(AbilityKind::SinkLand, 0.0, 0.0, &mut fx.ctx())
            .is_ok());
    }

    #[test]
    fn test_insufficient_mana_leaves_cooldown_clear() {
        let mut fx = Fixture::new(44.0);
        let mut combat = CombatSystem::new();
        let err = combat
            .use_ability(AbilityKind::Earthquake, 0.0, 0.0, &mut fx.ctx())
            .unwrap_err();
        assert!(matches!(err, SimError::InsufficientMana { .. }));
        assert_eq!(combat.cooldown(AbilityKind::Earthquake), 0.0);
        assert_eq!(fx.ledger.mana(), 44.0);
        assert!(fx.notes.is_empty());
    }

    #[test]
    fn test_sink_land_slows_then_restores() {
        let mut fx = Fixture::new(100.0);
        let id = fx.population.spawn_invader_at(Vec2::new(300.0, 300.0), &mut fx.notes);
        let mut combat = CombatSystem::new();
        combat
            .use_ability(AbilityKind::SinkLand, 300.0, 300.0, &mut fx.ctx())
            .unwrap();

        let invader = fx.population.get(id).unwrap();
        assert_eq!(invader.health, Some(80.0));
        assert_eq!(invader.body.speed, invader.base_speed * 0.5);
        assert_eq!(combat.active_effects().len(), 1);
        assert_eq!(fx.population.pending_tasks(id), 1);
    }

    #[test]
    fn test_earthquake_centers_on_island_and_upsets_natives() {
        let mut fx = Fixture::new(100.0);
        let inside = fx.population.spawn_invader_at(Vec2::new(500.0, 300.0), &mut fx.notes);
        let outside = fx.population.spawn_invader_at(Vec2::new(10.0, 10.0), &mut fx.notes);
        let native = fx.population.spawn_native(&mut fx.rng, &mut fx.notes);
        let before = fx.population.get(native).unwrap().happiness;

        let mut combat = CombatSystem::new();
        // The picked point is ignored
        let report = combat
            .use_ability(AbilityKind::Earthquake, 10.0, 10.0, &mut fx.ctx())
            .unwrap();

        assert_eq!(report.affected, 1);
        assert_eq!(fx.population.get(inside).unwrap().health, Some(70.0));
        assert_eq!(fx.population.get(outside).unwrap().health, Some(100.0));
        assert_eq!(fx.population.get(native).unwrap().happiness, before - 5.0);
    }

    #[test]
    fn test_unknown_ability_key() {
        assert_eq!("sinkLand".parse::<AbilityKind>().unwrap(), AbilityKind::SinkLand);
        assert!(matches!(
            "meteor".parse::<AbilityKind>(),
            Err(SimError::UnknownKey { catalog: "ability", .. })
        ));
    }

    #[test]
    fn test_melee_kills_true_believer() {
        let mut fx = Fixture::new(50.0);
        fx.ledger.add_hearts(2);
        let pos = Vec2::new(400.0, 300.0);
        let native = fx.population.spawn_native_at(pos, &mut fx.rng, &mut fx.notes);
        {
            let n = fx.population.get_mut(native).unwrap();
            n.happiness = 15.0;
            n.is_true_believer = true;
        }
        fx.population.spawn_invader_at(Vec2::new(410.0, 300.0), &mut fx.notes);

        let mut combat = CombatSystem::new();
        combat.update(1.0, &mut fx.ctx());
        assert_eq!(fx.population.get(native).unwrap().happiness, 5.0);

        combat.update(1.0, &mut fx.ctx());
        assert!(!fx.population.contains(native));
        assert_eq!(fx.ledger.faith(), 40.0);
        assert_eq!(fx.ledger.hearts(), 1);
    }

    #[test]
    fn test_melee_waits_for_full_interval() {
        let mut fx = Fixture::new(50.0);
        let native = fx
            .population
            .spawn_native_at(Vec2::new(0.0, 0.0), &mut fx.rng, &mut fx.notes);
        let before = fx.population.get(native).unwrap().happiness;
        fx.population.spawn_invader_at(Vec2::new(5.0, 0.0), &mut fx.notes);

        let mut combat = CombatSystem::new();
        combat.update(0.5, &mut fx.ctx());
        assert_eq!(fx.population.get(native).unwrap().happiness, before);
        combat.update(0.5, &mut fx.ctx());
        assert_eq!(fx.population.get(native).unwrap().happiness, before - 10.0);
    }
}
