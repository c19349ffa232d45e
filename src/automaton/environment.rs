//! Decay and growth: the two phases after the action phase.

use std::collections::{BTreeMap, BTreeSet};

use crate::automaton::Automaton;
use crate::game::{Change, Descriptor, Hazard, Player, Position, TileToken, TileType};

impl Automaton {
    /// Environmental damage, then contamination fading, then chaos from
    /// emitting buildings. Cells are handled row-major.
    pub(super) fn decay(&mut self) {
        let cells: Vec<Position> = self.board.iter().map(|(position, _)| position).collect();
        for &position in &cells {
            self.check_environment_damage(position);
        }
        for &position in &cells {
            self.dissipate(position);
        }
        for &position in &cells {
            self.accumulate_chaos(position);
        }
    }

    fn dissipate(&mut self, position: Position) {
        let subject = Descriptor::cell(position);
        let environment = self.board.at(position).environment;
        let recipients = self.seen(position);
        if environment.gas > 0 {
            let value = environment.gas.saturating_sub(self.bible.gas_dissipation).max(0);
            if value != environment.gas {
                self.emit(Change::Gas { subject, value }, recipients);
            }
        }
        if environment.radiation > 0 {
            let value = environment
                .radiation
                .saturating_sub(self.bible.radiation_dissipation)
                .max(0);
            if value != environment.radiation {
                self.emit(Change::Radiation { subject, value }, recipients);
            }
        }
    }

    /// Owned buildings with emission raise chaos; enough chaos turns the cell
    /// into a death zone.
    fn accumulate_chaos(&mut self, position: Position) {
        let subject = Descriptor::cell(position);
        let space = self.board.at(position);
        let environment = space.environment;
        let emission = if space.tile.is_owned() {
            self.bible.tile(space.tile.tile_type).emission
        } else {
            0
        };
        let recipients = self.seen(position);
        let mut chaos = environment.chaos;
        if emission > 0 {
            chaos = chaos.saturating_add(emission).min(self.bible.chaos_max);
            if chaos != environment.chaos {
                self.emit(Change::Chaos { subject, value: chaos }, recipients);
            }
        }
        let death = chaos >= self.bible.death_chaos;
        if death != environment.death {
            self.emit(
                Change::Hazard {
                    subject,
                    hazard: Hazard::Death,
                    active: death,
                },
                recipients,
            );
        }
    }

    /// Income, power regrowth, plant growth and, when a season ends, the new
    /// season's weather.
    pub(super) fn growth(&mut self) {
        self.collect_income();
        self.regrow_power();
        self.grow_plants();
        if self.round.season_ends() {
            self.change_weather();
        }
    }

    fn collect_income(&mut self) {
        let mut income: BTreeMap<Player, i32> = BTreeMap::new();
        for (_, space) in self.board.iter() {
            let tile = space.tile;
            if tile.is_owned() {
                let earned = self
                    .bible
                    .tile(tile.tile_type)
                    .income
                    .saturating_mul(i32::from(tile.stacks));
                *income.entry(tile.owner).or_default() += earned;
            }
        }
        let balances: Vec<(Player, i32)> = self
            .players
            .alive()
            .map(|data| (data.player, data.money))
            .collect();
        for (player, money) in balances {
            let earned = income.get(&player).copied().unwrap_or(0);
            let total = money
                .saturating_add(earned)
                .min(self.bible.money_max.max(money));
            if total != money {
                self.set_money(player, total);
            }
        }
    }

    /// Every owned building gets one depowered stack back.
    fn regrow_power(&mut self) {
        let recharged: Vec<(Position, TileToken)> = self
            .board
            .iter()
            .filter(|(_, space)| space.tile.is_owned() && space.tile.power < space.tile.stacks)
            .map(|(position, space)| (position, space.tile))
            .collect();
        for (position, tile) in recharged {
            let recipients = self.seen(position);
            self.emit(
                Change::Tile {
                    subject: Descriptor::tile(position),
                    tile: TileToken {
                        power: tile.power + 1,
                        ..tile
                    },
                },
                recipients,
            );
        }
    }

    /// Soil ripens into crops; forests spread onto neighbouring grass.
    fn grow_plants(&mut self) {
        let mut ripened = Vec::new();
        let mut seeded = BTreeSet::new();
        for (position, space) in self.board.iter() {
            if space.tile.is_owned() {
                continue;
            }
            match space.tile.tile_type {
                TileType::Soil => {
                    if self.rng.chance(self.bible.crops_chance) {
                        ripened.push(position);
                    }
                }
                TileType::Forest => {
                    for neighbor in self.board.neighbors(position) {
                        let tile = self.board.at(neighbor).tile;
                        if tile.tile_type == TileType::Grass
                            && !tile.is_owned()
                            && self.rng.chance(self.bible.forest_chance)
                        {
                            seeded.insert(neighbor);
                        }
                    }
                }
                _ => {}
            }
        }
        let grown = ripened
            .into_iter()
            .map(|position| (position, TileType::Crops))
            .chain(seeded.into_iter().map(|position| (position, TileType::Forest)));
        for (position, tile_type) in grown.collect::<Vec<_>>() {
            let recipients = self.seen(position);
            self.emit(
                Change::Tile {
                    subject: Descriptor::tile(position),
                    tile: TileToken::natural(tile_type),
                },
                recipients,
            );
        }
    }

    /// Set temperature and humidity to the coming season's climate and
    /// switch hazards accordingly. Only differences are emitted.
    fn change_weather(&mut self) {
        let season = self.round.advanced().season;
        let climate = self.bible.climate(season.index());
        let cells: Vec<Position> = self.board.iter().map(|(position, _)| position).collect();
        for position in cells {
            let subject = Descriptor::cell(position);
            let environment = self.board.at(position).environment;
            let wet = self.near_water(position);

            let temperature = climate.temperature.saturating_add(environment.chaos / 10);
            let humidity = if wet {
                climate.humidity.saturating_add(self.bible.water_humidity)
            } else {
                climate.humidity
            };
            let b = &self.bible;
            let hazards = [
                (
                    Hazard::Snow,
                    temperature <= b.snow_temperature && humidity >= b.snow_humidity,
                ),
                (Hazard::Frostbite, temperature <= b.frostbite_temperature),
                (
                    Hazard::Firestorm,
                    temperature >= b.firestorm_temperature && humidity <= b.firestorm_humidity,
                ),
                (Hazard::Bonedrought, humidity <= b.bonedrought_humidity),
            ];

            let recipients = self.seen(position);
            if temperature != environment.temperature {
                let value = temperature;
                self.emit(Change::Temperature { subject, value }, recipients);
            }
            if humidity != environment.humidity {
                let value = humidity;
                self.emit(Change::Humidity { subject, value }, recipients);
            }
            for (hazard, active) in hazards {
                if environment.hazard(hazard) != active {
                    self.emit(
                        Change::Hazard {
                            subject,
                            hazard,
                            active,
                        },
                        recipients,
                    );
                }
            }
        }
    }

    fn near_water(&self, position: Position) -> bool {
        std::iter::once(position)
            .chain(self.board.neighbors(position))
            .any(|p| self.board.at(p).tile.tile_type == TileType::Water)
    }
}

#[cfg(test)]
mod tests {
    use crate::automaton::tests::{duel, duel_board};
    use crate::game::{Change, Hazard, Phase, Player, Position, TileToken, TileType};

    fn to_decay(automaton: &mut crate::automaton::Automaton) {
        automaton.hibernate();
        automaton.awake();
        automaton.prepare();
    }

    #[test]
    fn test_gas_dissipates_after_hurting() {
        let mut board = duel_board();
        let space = board.at_mut(Position::new(1, 1)).unwrap();
        space.environment.gas = 2;
        let mut automaton = duel(board);
        to_decay(&mut automaton);
        automaton.act();
        assert_eq!(automaton.round().phase, Phase::Decay);
        assert_eq!(automaton.board().at(Position::new(1, 1)).environment.gas, 1);
    }

    #[test]
    fn test_emission_raises_chaos_until_death() {
        let mut board = duel_board();
        board.at_mut(Position::new(0, 1)).unwrap().tile =
            TileToken::owned(TileType::Reactor, Player::Red, 1, 1);
        board.at_mut(Position::new(0, 1)).unwrap().environment.chaos = 39;
        let mut automaton = duel(board);
        to_decay(&mut automaton);
        let changes = automaton.act();
        let environment = automaton.board().at(Position::new(0, 1)).environment;
        assert_eq!(environment.chaos, 42);
        assert!(environment.death);
        assert!(changes.iter().any(|(c, _)| matches!(
            c,
            Change::Hazard {
                hazard: Hazard::Death,
                active: true,
                ..
            }
        )));
    }

    #[test]
    fn test_growth_pays_income_and_restores_power() {
        let mut board = duel_board();
        board.at_mut(Position::new(0, 0)).unwrap().tile =
            TileToken::owned(TileType::Town, Player::Red, 3, 1);
        let mut automaton = duel(board);
        to_decay(&mut automaton);
        automaton.act();
        automaton.act();
        assert_eq!(automaton.round().phase, Phase::Growth);
        let red = automaton.players().get(Player::Red).unwrap();
        assert_eq!(red.money, 20 + 2 * 3);
        assert_eq!(automaton.board().at(Position::new(0, 0)).tile.power, 2);
    }

    #[test]
    fn test_income_respects_cap() {
        let mut automaton = duel(duel_board());
        automaton.hibernate();
        let cap = automaton.bible().money_max;
        automaton.enact(
            &Change::Funds {
                player: Player::Red,
                money: cap - 1,
            },
            crate::game::Vision::EMPTY,
        );
        automaton.awake();
        automaton.prepare();
        automaton.act();
        automaton.act();
        assert_eq!(automaton.players().get(Player::Red).unwrap().money, cap);
    }

    #[test]
    fn test_weather_changes_at_season_end() {
        let mut board = duel_board();
        board.at_mut(Position::new(1, 1)).unwrap().tile = TileToken::natural(TileType::Water);
        let mut automaton = duel(board);
        automaton.run_round();
        // the first round is early spring; nothing changes yet
        assert_eq!(automaton.board().at(Position::new(0, 0)).environment.temperature, 0);
        automaton.run_round();
        let summer = automaton.bible().seasons[1];
        let dry = automaton.board().at(Position::new(0, 0)).environment;
        let wet = automaton.board().at(Position::new(0, 1)).environment;
        assert_eq!(dry.temperature, summer.temperature);
        assert_eq!(dry.humidity, summer.humidity);
        assert_eq!(wet.humidity, summer.humidity + automaton.bible().water_humidity);
    }
}
