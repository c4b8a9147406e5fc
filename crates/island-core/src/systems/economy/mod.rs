//! Resource Economy
//!
//! Rituals, summons and the per-day faith and mana formulas. The ledger itself
//! belongs to the host; this system only patches it through [`SimContext`].

pub mod rituals;
pub mod summons;

use bevy_ecs::prelude::*;
use rand::Rng;
use tracing::{debug, info};

use island_events::{GameEvent, LifecycleEvent, PopulationKind};

use crate::ai::{occurs, EconomyView, SummonSighting};
use crate::components::world::{HEARTLAND, ISLAND_CENTER};
use crate::components::{GameState, SummonId, Vec2};
use crate::context::SimContext;
use crate::error::SimError;
use crate::systems::population::PopulationRegistry;

pub use rituals::{RitualDef, RitualEffects, RitualKind};
pub use summons::{Summon, SummonDef, SummonKind};

/// Formula and buff tuning
pub mod economy_constants {
    pub const BASE_MANA_GAIN: f32 = 5.0;
    pub const TRUE_BELIEVER_MANA_MULTIPLIER: f32 = 2.0;
    pub const GLOBAL_FAITH_MANA_SCALE: f32 = 10.0;
    pub const MANA_PER_HEART: f32 = 3.0;

    pub const NEUTRAL_HAPPINESS: f32 = 50.0;
    pub const HAPPINESS_FAITH_DIVISOR: f32 = 25.0;
    pub const FAITH_PER_ACTIVE_SITE: f32 = 0.5;
    pub const FAITH_LOSS_PER_INVADER: f32 = 0.5;

    /// Ritual sites are placed within this many pixels of the island center
    pub const RITUAL_SITE_SPREAD: f32 = 50.0;

    /// Per-second rate of the blessing's +1 happiness pulse
    pub const BLESSING_PULSE_RATE: f32 = 0.1;
    pub const BLESSING_PULSE_HAPPINESS: f32 = 1.0;
    /// Birth rate per second per point of fertility
    pub const FERTILITY_BIRTH_RATE: f32 = 0.01;
}

use economy_constants::*;

/// A reusable spot where a ritual's duration is tracked
#[derive(Debug, Clone, PartialEq)]
pub struct RitualSite {
    pub position: Vec2,
    pub active: bool,
    pub ritual: Option<RitualKind>,
    pub time_remaining: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveBlessing {
    pub time_remaining: f32,
    pub fertility: f32,
}

/// Outcome of a successful ritual
#[derive(Debug, Clone, PartialEq)]
pub struct RitualReport {
    pub kind: RitualKind,
    pub mana_spent: f32,
    pub site: usize,
    pub effects: RitualEffects,
}

#[derive(Resource, Debug, Default)]
pub struct FaithSystem {
    ritual_sites: Vec<RitualSite>,
    blessings: Vec<ActiveBlessing>,
    summons: Vec<Summon>,
    next_summon_id: u64,
}

impl FaithSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ritual_sites(&self) -> &[RitualSite] {
        &self.ritual_sites
    }

    pub fn active_site_count(&self) -> usize {
        self.ritual_sites
            .iter()
            .filter(|s| s.active && s.ritual.is_some())
            .count()
    }

    pub fn blessings(&self) -> &[ActiveBlessing] {
        &self.blessings
    }

    pub fn summons(&self) -> &[Summon] {
        &self.summons
    }

    /// Pay for and perform a ritual. Nothing changes if it is rejected.
    pub fn perform_ritual(
        &mut self,
        kind: RitualKind,
        ctx: &mut SimContext<'_>,
    ) -> Result<RitualReport, SimError> {
        let def = kind.definition();
        ctx.ledger.ensure_mana(def.mana_cost)?;
        if kind == RitualKind::Sacrifice && ctx.population.natives().is_empty() {
            return Err(SimError::NoSacrifice);
        }
        ctx.ledger.spend_mana(def.mana_cost)?;

        let site = self.claim_site(kind, ctx.rng);
        let effects = (def.effect)(self, ctx);

        info!(
            "{} performed (faith +{:.0}, hearts +{})",
            kind, effects.faith_gained, effects.hearts_gained
        );
        ctx.notifications.emit(GameEvent::RitualCompleted {
            ritual: kind.as_str().to_string(),
        });

        Ok(RitualReport {
            kind,
            mana_spent: def.mana_cost,
            site,
            effects,
        })
    }

    /// Light an idle ritual site, or build a new one if every site is busy.
    /// Sites are never capped.
    fn claim_site<R: Rng>(&mut self, kind: RitualKind, rng: &mut R) -> usize {
        let index = match self.ritual_sites.iter().position(|s| !s.active) {
            Some(index) => index,
            None => {
                let position = Vec2::new(
                    ISLAND_CENTER.x + rng.gen_range(-RITUAL_SITE_SPREAD..=RITUAL_SITE_SPREAD),
                    ISLAND_CENTER.y + rng.gen_range(-RITUAL_SITE_SPREAD..=RITUAL_SITE_SPREAD),
                );
                self.ritual_sites.push(RitualSite {
                    position,
                    active: false,
                    ritual: None,
                    time_remaining: 0.0,
                });
                debug!("ritual site #{} created", self.ritual_sites.len());
                self.ritual_sites.len() - 1
            }
        };

        let site = &mut self.ritual_sites[index];
        site.active = true;
        site.ritual = Some(kind);
        site.time_remaining = kind.definition().duration;
        index
    }

    /// Pay for and call up a summon in the village core
    pub fn summon_entity(
        &mut self,
        kind: SummonKind,
        ctx: &mut SimContext<'_>,
    ) -> Result<SummonId, SimError> {
        ctx.ledger.spend_mana(kind.definition().mana_cost)?;

        self.next_summon_id += 1;
        let id = SummonId(self.next_summon_id);
        let position = HEARTLAND.random_point(ctx.rng);
        self.summons.push(Summon::new(id, kind, position));

        info!("{} summoned at ({:.0}, {:.0})", kind, position.x, position.y);
        ctx.notifications.lifecycle(LifecycleEvent::SummonAppeared {
            id: id.0,
            summon: kind.as_str().to_string(),
            x: position.x,
            y: position.y,
        });
        ctx.notifications.emit(GameEvent::EntitySummoned {
            summon: kind.as_str().to_string(),
        });
        Ok(id)
    }

    /// Daily mana income, floored to a whole number
    pub fn calculate_mana_gain(&self, ledger: &GameState, population: &PopulationRegistry) -> u32 {
        let devotion: f32 = population
            .natives()
            .iter()
            .map(|n| {
                let weight = if n.is_true_believer {
                    TRUE_BELIEVER_MANA_MULTIPLIER
                } else {
                    1.0
                };
                n.faith / 100.0 * weight
            })
            .sum();
        let gain = BASE_MANA_GAIN
            + devotion
            + ledger.faith() / 100.0 * GLOBAL_FAITH_MANA_SCALE
            + ledger.hearts() as f32 * MANA_PER_HEART;
        gain.floor().max(0.0) as u32
    }

    /// Daily faith drift. With no natives the average happiness counts as zero.
    pub fn calculate_faith_change(&self, population: &PopulationRegistry) -> f32 {
        let natives = population.natives();
        let avg_happiness = if natives.is_empty() {
            0.0
        } else {
            natives.iter().map(|n| n.happiness).sum::<f32>() / natives.len() as f32
        };
        (avg_happiness - NEUTRAL_HAPPINESS) / HAPPINESS_FAITH_DIVISOR
            + self.active_site_count() as f32 * FAITH_PER_ACTIVE_SITE
            - population.count(PopulationKind::Invader) as f32 * FAITH_LOSS_PER_INVADER
    }

    /// What entity behavior needs to know about the economy this frame
    pub fn sightings(&self) -> EconomyView {
        EconomyView {
            active_ritual_sites: self
                .ritual_sites
                .iter()
                .filter(|s| s.active)
                .map(|s| s.position)
                .collect(),
            summons: self
                .summons
                .iter()
                .map(|s| SummonSighting {
                    id: s.id,
                    kind: s.kind,
                    position: s.position,
                })
                .collect(),
            blessing_active: !self.blessings.is_empty(),
        }
    }

    /// Count down sites, blessings and summons, and run summon behavior
    pub fn update(&mut self, dt: f32, ctx: &mut SimContext<'_>) {
        for site in self.ritual_sites.iter_mut().filter(|s| s.active) {
            site.time_remaining = (site.time_remaining - dt).max(0.0);
            if site.time_remaining <= 0.0 {
                site.active = false;
                site.ritual = None;
            }
        }

        self.update_blessings(dt, ctx);

        for summon in &mut self.summons {
            (summon.kind.definition().behavior)(summon, ctx, dt);
            summon.time_remaining = (summon.time_remaining - dt).max(0.0);
        }
        let mut expired = Vec::new();
        self.summons.retain(|s| {
            if s.time_remaining > 0.0 {
                true
            } else {
                expired.push((s.id, s.kind));
                false
            }
        });
        for (id, kind) in expired {
            debug!("{} faded away", kind);
            ctx.notifications.lifecycle(LifecycleEvent::SummonExpired {
                id: id.0,
                summon: kind.as_str().to_string(),
            });
        }
    }

    fn update_blessings(&mut self, dt: f32, ctx: &mut SimContext<'_>) {
        for blessing in &mut self.blessings {
            blessing.time_remaining = (blessing.time_remaining - dt).max(0.0);

            if occurs(ctx.rng, BLESSING_PULSE_RATE, dt) {
                for native in ctx.population.natives_mut() {
                    native.adjust_happiness(BLESSING_PULSE_HAPPINESS);
                }
            }
            if occurs(ctx.rng, FERTILITY_BIRTH_RATE * blessing.fertility, dt) {
                let id = ctx.population.spawn_native(ctx.rng, ctx.notifications);
                info!("a child {} was born under the blessing", id);
            }
        }
        self.blessings.retain(|b| b.time_remaining > 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::EntityId;
    use crate::events::Notifications;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    struct Fixture {
        ledger: GameState,
        population: PopulationRegistry,
        rng: SmallRng,
        notes: Notifications,
    }

    impl Fixture {
        fn new(faith: f32, mana: f32) -> Self {
            Self {
                ledger: GameState::new(faith, mana, 0),
                population: PopulationRegistry::new(),
                rng: SmallRng::seed_from_u64(42),
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

        fn spawn_natives(&mut self, count: usize) {
            for _ in 0..count {
                self.population.spawn_native(&mut self.rng, &mut self.notes);
            }
        }
    }

    #[test]
    fn test_basic_ritual_costs_and_gains() {
        let mut fx = Fixture::new(50.0, 30.0);
        let mut faith = FaithSystem::new();
        let report = faith
            .perform_ritual(RitualKind::Basic, &mut fx.ctx())
            .unwrap();

        assert_eq!(report.mana_spent, 10.0);
        assert_eq!(fx.ledger.mana(), 20.0);
        assert_eq!(fx.ledger.faith(), 55.0);
        assert_eq!(faith.active_site_count(), 1);
        assert!(fx.notes.game_events().any(|e| *e
            == GameEvent::RitualCompleted {
                ritual: "basic".to_string()
            }));
    }

    #[test]
    fn test_ritual_rejected_without_mana() {
        let mut fx = Fixture::new(50.0, 9.0);
        let mut faith = FaithSystem::new();
        let err = faith
            .perform_ritual(RitualKind::Basic, &mut fx.ctx())
            .unwrap_err();
        assert!(matches!(err, SimError::InsufficientMana { .. }));
        assert_eq!(fx.ledger.mana(), 9.0);
        assert_eq!(fx.ledger.faith(), 50.0);
        assert!(faith.ritual_sites().is_empty());
        assert!(fx.notes.is_empty());
    }

    #[test]
    fn test_sacrifice_plain_native() {
        let mut fx = Fixture::new(50.0, 30.0);
        fx.spawn_natives(1);
        fx.population.natives_mut()[0].is_true_believer = false;

        let mut faith = FaithSystem::new();
        let report = faith
            .perform_ritual(RitualKind::Sacrifice, &mut fx.ctx())
            .unwrap();
        assert!(report.effects.sacrificed.is_some());
        assert_eq!(fx.population.count(PopulationKind::Native), 0);
        assert_eq!(fx.ledger.faith(), 65.0);
        assert_eq!(fx.ledger.hearts(), 0);
        assert_eq!(fx.ledger.mana(), 5.0);
    }

    #[test]
    fn test_sacrifice_true_believer() {
        let mut fx = Fixture::new(50.0, 30.0);
        fx.spawn_natives(1);
        fx.population.natives_mut()[0].is_true_believer = true;

        let mut faith = FaithSystem::new();
        faith
            .perform_ritual(RitualKind::Sacrifice, &mut fx.ctx())
            .unwrap();
        assert_eq!(fx.population.count(PopulationKind::Native), 0);
        assert_eq!(fx.ledger.faith(), 80.0);
        assert_eq!(fx.ledger.hearts(), 1);
    }

    #[test]
    fn test_sacrifice_needs_a_native() {
        let mut fx = Fixture::new(50.0, 30.0);
        let mut faith = FaithSystem::new();
        let err = faith
            .perform_ritual(RitualKind::Sacrifice, &mut fx.ctx())
            .unwrap_err();
        assert_eq!(err, SimError::NoSacrifice);
        assert_eq!(fx.ledger.mana(), 30.0);
    }

    #[test]
    fn test_blessing_lifts_happiness() {
        let mut fx = Fixture::new(50.0, 30.0);
        fx.spawn_natives(3);
        let mut faith = FaithSystem::new();
        faith
            .perform_ritual(RitualKind::Blessing, &mut fx.ctx())
            .unwrap();

        assert!(fx.population.natives().iter().all(|n| n.happiness == 60.0));
        assert_eq!(faith.blessings().len(), 1);
        assert!(faith.sightings().blessing_active);
    }

    #[test]
    fn test_blessing_pulses_and_births_until_it_lapses() {
        let mut pulsed = 0;
        let mut births = 0;
        for seed in 0..20 {
            let mut fx = Fixture::new(50.0, 30.0);
            fx.rng = SmallRng::seed_from_u64(seed);
            fx.spawn_natives(3);
            let elders: Vec<EntityId> = fx.population.natives().iter().map(|n| n.id()).collect();
            let mut faith = FaithSystem::new();
            faith
                .perform_ritual(RitualKind::Blessing, &mut fx.ctx())
                .unwrap();
            assert_eq!(faith.blessings()[0].fertility, 5.0);

            // 30s buff in half-second frames
            for _ in 0..59 {
                faith.update(0.5, &mut fx.ctx());
            }
            assert_eq!(faith.blessings().len(), 1);
            faith.update(0.5, &mut fx.ctx());
            assert!(faith.blessings().is_empty());
            assert!(!faith.sightings().blessing_active);

            let elder = fx.population.get(elders[0]).unwrap();
            if elder.happiness > 60.0 {
                pulsed += 1;
            }
            births += fx.population.count(PopulationKind::Native) - elders.len();
        }
        // Three pulses and one and a half births expected per blessing
        assert!(pulsed > 10, "happiness pulsed in {pulsed} of 20 runs");
        assert!(births > 10, "{births} natives born over 20 runs");
    }

    #[test]
    fn test_defender_cuts_down_invader_in_reach() {
        let mut fx = Fixture::new(50.0, 100.0);
        let mut faith = FaithSystem::new();
        faith
            .summon_entity(SummonKind::Defender, &mut fx.ctx())
            .unwrap();
        let invader = fx
            .population
            .spawn_invader_at(faith.summons()[0].position, &mut fx.notes);

        // 100 health at 5 dps, with the invader dogging the defender's patrol
        for _ in 0..210 {
            let guard = faith.summons()[0].position;
            if let Some(entity) = fx.population.get_mut(invader) {
                entity.body.position = Vec2::new(guard.x + 10.0, guard.y);
            }
            faith.update(0.1, &mut fx.ctx());
        }
        assert!(!fx.population.contains(invader));
        assert!(fx.notes.game_events().any(|e| *e
            == GameEvent::CombatResult {
                result: "Invader defeated by Defender".to_string()
            }));
    }

    #[test]
    fn test_defender_ignores_invader_out_of_reach() {
        let mut fx = Fixture::new(50.0, 100.0);
        let mut faith = FaithSystem::new();
        faith
            .summon_entity(SummonKind::Defender, &mut fx.ctx())
            .unwrap();
        // Patrols stay in the village core, far from the corner
        let invader = fx
            .population
            .spawn_invader_at(Vec2::new(0.0, 0.0), &mut fx.notes);

        for _ in 0..250 {
            faith.update(0.1, &mut fx.ctx());
        }
        assert_eq!(fx.population.get(invader).unwrap().health, Some(100.0));
        assert!(!fx
            .notes
            .game_events()
            .any(|e| matches!(e, GameEvent::CombatResult { .. })));
    }

    #[test]
    fn test_ritual_sites_reused_then_grown() {
        let mut fx = Fixture::new(50.0, 100.0);
        let mut faith = FaithSystem::new();
        faith.perform_ritual(RitualKind::Basic, &mut fx.ctx()).unwrap();
        faith.perform_ritual(RitualKind::Basic, &mut fx.ctx()).unwrap();
        assert_eq!(faith.ritual_sites().len(), 2);

        // Let both burn out, then the next ritual reuses the first slot
        faith.update(11.0, &mut fx.ctx());
        assert_eq!(faith.active_site_count(), 0);
        let report = faith.perform_ritual(RitualKind::Basic, &mut fx.ctx()).unwrap();
        assert_eq!(report.site, 0);
        assert_eq!(faith.ritual_sites().len(), 2);
        for site in faith.ritual_sites() {
            assert!(site.position.distance(ISLAND_CENTER) <= RITUAL_SITE_SPREAD * 1.5);
        }
    }

    #[test]
    fn test_unknown_keys() {
        assert_eq!("blessing".parse::<RitualKind>().unwrap(), RitualKind::Blessing);
        assert!(matches!(
            "rain_dance".parse::<RitualKind>(),
            Err(SimError::UnknownKey { catalog: "ritual", .. })
        ));
        assert_eq!("demon".parse::<SummonKind>().unwrap(), SummonKind::Demon);
        assert!("dragon".parse::<SummonKind>().is_err());
    }

    #[test]
    fn test_summon_costs_and_expires() {
        let mut fx = Fixture::new(50.0, 40.0);
        let mut faith = FaithSystem::new();
        faith.summon_entity(SummonKind::Shadow, &mut fx.ctx()).unwrap();
        assert_eq!(fx.ledger.mana(), 20.0);
        assert_eq!(faith.summons().len(), 1);
        assert!(fx.notes.game_events().any(|e| *e
            == GameEvent::EntitySummoned {
                summon: "shadow".to_string()
            }));

        let err = faith
            .summon_entity(SummonKind::Demon, &mut fx.ctx())
            .unwrap_err();
        assert!(matches!(err, SimError::InsufficientMana { .. }));

        for _ in 0..61 {
            faith.update(1.0, &mut fx.ctx());
        }
        assert!(faith.summons().is_empty());
    }

    #[test]
    fn test_demon_kills_adjacent_invader() {
        let mut fx = Fixture::new(50.0, 100.0);
        let mut faith = FaithSystem::new();
        faith.summon_entity(SummonKind::Demon, &mut fx.ctx()).unwrap();
        let pos = faith.summons()[0].position;
        fx.population.spawn_invader_at(pos, &mut fx.notes);

        // 100 health at 15 dps
        for _ in 0..8 {
            faith.update(1.0, &mut fx.ctx());
        }
        assert_eq!(fx.population.count(PopulationKind::Invader), 0);
        assert!(fx.notes.game_events().any(|e| *e
            == GameEvent::CombatResult {
                result: "Invader obliterated by Demon".to_string()
            }));
    }

    #[test]
    fn test_shadow_frightens_nearby_invader() {
        let mut fx = Fixture::new(50.0, 100.0);
        let mut faith = FaithSystem::new();
        faith.summon_entity(SummonKind::Shadow, &mut fx.ctx()).unwrap();
        let pos = faith.summons()[0].position;
        let invader = fx.population.spawn_invader_at(pos, &mut fx.notes);

        faith.update(0.1, &mut fx.ctx());
        let entity = fx.population.get(invader).unwrap();
        assert_eq!(entity.brain.state_name(), "scared");
        assert_eq!(fx.population.pending_tasks(invader), 1);
    }

    #[test]
    fn test_mana_gain_formula() {
        let mut fx = Fixture::new(50.0, 30.0);
        fx.spawn_natives(2);
        {
            let natives = fx.population.natives_mut();
            natives[0].faith = 50.0;
            natives[0].is_true_believer = false;
            natives[1].faith = 50.0;
            natives[1].is_true_believer = true;
        }
        fx.ledger.add_hearts(2);
        let faith = FaithSystem::new();
        // 5 + (0.5 + 1.0) + 5 + 6 = 17.5
        assert_eq!(faith.calculate_mana_gain(&fx.ledger, &fx.population), 17);
    }

    #[test]
    fn test_faith_change_formula() {
        let mut fx = Fixture::new(50.0, 100.0);
        let mut faith = FaithSystem::new();
        // No natives counts as zero happiness
        assert_eq!(faith.calculate_faith_change(&fx.population), -2.0);

        fx.spawn_natives(2);
        for native in fx.population.natives_mut() {
            native.happiness = 75.0;
        }
        fx.population.spawn_invader_at(Vec2::new(0.0, 0.0), &mut fx.notes);
        faith.perform_ritual(RitualKind::Basic, &mut fx.ctx()).unwrap();
        // (75 - 50) / 25 + 0.5 - 0.5
        assert_eq!(faith.calculate_faith_change(&fx.population), 1.0);
    }
}
