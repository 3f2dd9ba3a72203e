//! End-to-end scenarios.
//!
//! Each test drives a full controller against the simulated host through
//! real event sequences and checks one observable rule of the mode. The
//! per-module unit tests cover the pieces; these cover the seams.

use crate::config::ModeConfig;
use crate::controller::VipFiesta;
use crate::host::{Audience, Host, Notice};
use crate::ring::RingPatrol;
use crate::schedule::STARTUP_GRACE_SECS;
use crate::sim::SimHost;
use crate::state::MatchPhase;
use crate::types::{PlayerId, TeamId, Vec3};

/// Roster of `teams * per_team` players, ids counting up from 1, everyone
/// deployed.
fn roster(teams: u32, per_team: u32) -> SimHost {
    let host = SimHost::new();
    let mut next = 1;
    for team in 1..=teams {
        for _ in 0..per_team {
            host.add_player(PlayerId(next), &format!("player{}", next), TeamId(team));
            host.deploy(PlayerId(next));
            next += 1;
        }
    }
    host
}

/// Initialize and run past the startup grace, so every active team has had
/// its first VIP pick.
fn start(host: &SimHost, cfg: ModeConfig, seed: u64) -> VipFiesta<SimHost> {
    let mut game = VipFiesta::new(host.clone(), cfg, seed);
    game.initialize();
    host.advance(STARTUP_GRACE_SECS);
    game.ongoing_player(PlayerId(1));
    game
}

/// Kill the sitting VIP of `team` with `killer`, then wait out the respawn
/// delay so the slot refills.
fn kill_vip_and_refill(
    game: &mut VipFiesta<SimHost>,
    host: &SimHost,
    team: TeamId,
    killer: PlayerId,
) {
    let vip = game.state().vip_of(team).expect("team has a VIP to kill");
    game.on_player_died(vip, killer).unwrap();
    host.advance(game.config().vip_respawn_delay_secs);
    game.ongoing_player(killer);
}

#[test]
fn test_first_selection_waits_for_startup_grace() {
    let host = roster(2, 3);
    let mut game = VipFiesta::new(host.clone(), ModeConfig::default(), 23);
    game.initialize();

    host.advance(STARTUP_GRACE_SECS - 1.0);
    game.ongoing_player(PlayerId(1));
    assert!(game.state().vip_of(TeamId(1)).is_none());
    assert!(game.state().vip_of(TeamId(2)).is_none());

    host.advance(1.0);
    game.ongoing_player(PlayerId(1));
    assert!(game.state().vip_of(TeamId(1)).is_some());
    assert!(game.state().vip_of(TeamId(2)).is_some());
}

#[test]
fn test_cross_team_vip_kill_scores_exactly_one() {
    let host = roster(3, 2);
    let mut game = start(&host, ModeConfig::default(), 11);

    let victim = game.state().vip_of(TeamId(2)).unwrap();
    game.on_player_died(victim, PlayerId(1)).unwrap();

    assert_eq!(game.state().score(TeamId(1)), 1);
    assert_eq!(game.state().score(TeamId(2)), 0);
    assert_eq!(game.state().score(TeamId(3)), 0);
    assert_eq!(game.state().stats_of(PlayerId(1)).vip_kills, 1);
    assert_eq!(host.scoreboard_row(PlayerId(1)).unwrap().vip_kills, 1);
    assert!(host.world_log().contains(&(
        Notice::VipKilled { team: TeamId(1), score: 1, target: 20 },
        Audience::All
    )));
}

#[test]
fn test_same_team_and_self_kills_never_score() {
    let host = roster(2, 2);
    let mut game = start(&host, ModeConfig::default(), 3);

    // A teammate downs their own VIP.
    let vip1 = game.state().vip_of(TeamId(1)).unwrap();
    let teammate = host.team_members(TeamId(1)).into_iter().find(|&p| p != vip1).unwrap();
    game.on_player_died(vip1, teammate).unwrap();
    assert!(game.state().slot(TeamId(1)).is_cooldown());
    assert!(!host.is_spotted(vip1));

    // The other team's VIP takes themselves out.
    let vip2 = game.state().vip_of(TeamId(2)).unwrap();
    game.on_player_died(vip2, vip2).unwrap();
    assert!(game.state().slot(TeamId(2)).is_cooldown());

    assert_eq!(game.state().score(TeamId(1)), 0);
    assert_eq!(game.state().score(TeamId(2)), 0);
    // Generic counters still move; the VIP-kill counter does not.
    assert_eq!(game.state().stats_of(vip1).deaths, 1);
    assert_eq!(game.state().stats_of(teammate).kills, 1);
    assert_eq!(game.state().stats_of(teammate).vip_kills, 0);
    assert_eq!(game.state().stats_of(vip2).kills, 0);
}

#[test]
fn test_first_team_to_target_wins_even_with_same_tick_followup() {
    let host = roster(2, 2);
    let mut game = start(&host, ModeConfig::quick(), 5);
    let striker1 = PlayerId(1); // team 1
    let striker2 = PlayerId(3); // team 2

    for _ in 0..4 {
        kill_vip_and_refill(&mut game, &host, TeamId(2), striker1);
        kill_vip_and_refill(&mut game, &host, TeamId(1), striker2);
    }
    assert_eq!(game.state().score(TeamId(1)), 4);
    assert_eq!(game.state().score(TeamId(2)), 4);

    // The fifth point ends it; team 2's same-tick answer is dropped.
    let vip2 = game.state().vip_of(TeamId(2)).unwrap();
    game.on_player_died(vip2, striker1).unwrap();
    let vip1 = game.state().vip_of(TeamId(1)).unwrap();
    game.on_player_died(vip1, striker2).unwrap();

    assert_eq!(game.state().phase, MatchPhase::Ended);
    assert_eq!(host.round_winner(), Some(TeamId(1)));
    assert_eq!(game.state().score(TeamId(1)), 5);
    assert_eq!(game.state().score(TeamId(2)), 4);
    assert!(host
        .notifications()
        .contains(&(Notice::TeamWins { team: TeamId(1) }, Audience::All)));
}

#[test]
fn test_timeout_winner_highest_score_lowest_id() {
    let host = roster(3, 2);
    let mut game = start(&host, ModeConfig::default(), 17);
    let striker1 = PlayerId(1); // team 1
    let striker2 = PlayerId(3); // team 2
    let striker3 = PlayerId(5); // team 3

    for _ in 0..4 {
        kill_vip_and_refill(&mut game, &host, TeamId(2), striker1);
    }
    for _ in 0..7 {
        kill_vip_and_refill(&mut game, &host, TeamId(3), striker2);
    }
    for _ in 0..7 {
        kill_vip_and_refill(&mut game, &host, TeamId(1), striker3);
    }
    assert_eq!(game.state().score(TeamId(1)), 4);
    assert_eq!(game.state().score(TeamId(2)), 7);
    assert_eq!(game.state().score(TeamId(3)), 7);

    // Teams 2 and 3 are level; the lower id takes it.
    game.on_time_limit_reached();
    assert_eq!(game.state().phase, MatchPhase::Ended);
    assert_eq!(host.round_winner(), Some(TeamId(2)));
}

#[test]
fn test_reselect_with_one_alive_member_returns_that_member() {
    let host = SimHost::new();
    host.add_player(PlayerId(1), "solo", TeamId(1));
    host.add_player(PlayerId(2), "bench", TeamId(1));
    host.deploy(PlayerId(1));
    let mut game = start(&host, ModeConfig::default(), 2);
    assert_eq!(game.state().vip_of(TeamId(1)), Some(PlayerId(1)));

    // The leave event can arrive while the host still lists the player;
    // excluding the only deployed member falls back to the full pool.
    game.on_player_leave_game(PlayerId(1));
    assert_eq!(game.state().vip_of(TeamId(1)), Some(PlayerId(1)));
}

#[test]
fn test_vip_leave_reselects_immediately_without_cooldown() {
    let host = roster(1, 2);
    let mut game = start(&host, ModeConfig::default(), 8);

    let vip = game.state().vip_of(TeamId(1)).unwrap();
    let other = if vip == PlayerId(1) { PlayerId(2) } else { PlayerId(1) };

    host.remove_player(vip);
    game.on_player_leave_game(vip);

    assert_eq!(game.state().vip_of(TeamId(1)), Some(other));
    assert!(host.is_spotted(other));
    assert!(!game.state().slot(TeamId(1)).is_cooldown());
}

#[test]
fn test_spot_maintenance_throttled_to_refresh_rate() {
    let host = roster(1, 1);
    let mut game = start(&host, ModeConfig::default(), 1);
    let vip = PlayerId(1);
    assert_eq!(game.state().vip_of(TeamId(1)), Some(vip));
    let after_install = host.spot_count(vip);

    // Ticks at +1.0, +1.5 and +2.1 against a 1 Hz refresh rate.
    host.advance(1.0);
    game.ongoing_player(vip);
    host.advance(0.5);
    game.ongoing_player(vip);
    host.advance(0.6);
    game.ongoing_player(vip);

    assert_eq!(host.spot_count(vip) - after_install, 2);
}

#[test]
fn test_stale_cooldown_timer_dropped_after_match_end() {
    let host = roster(2, 2);
    let mut game = start(&host, ModeConfig::default(), 9);

    let vip = game.state().vip_of(TeamId(1)).unwrap();
    game.on_player_died(vip, PlayerId(3)).unwrap();
    assert!(game.state().slot(TeamId(1)).is_cooldown());

    game.on_time_limit_reached();
    assert_eq!(game.state().phase, MatchPhase::Ended);
    let notices_at_end = host.notifications().len();

    // The replacement timer fires past its due time and is discarded.
    host.advance(10.0);
    game.ongoing_player(PlayerId(1));
    assert!(game.state().slot(TeamId(1)).is_cooldown());
    assert_eq!(host.notifications().len(), notices_at_end);
    assert_eq!(game.pending_actions(), 0);
}

#[test]
fn test_unanswerable_deploy_query_excludes_candidate() {
    // Whatever the seed, a player the host cannot vouch for is never picked.
    for seed in 0..5 {
        let host = roster(1, 2);
        host.fail_deploy_query(PlayerId(2), true);
        let game = start(&host, ModeConfig::default(), seed);
        assert_eq!(game.state().vip_of(TeamId(1)), Some(PlayerId(1)));
    }
}

#[test]
fn test_board_shows_top_three_and_observer_row() {
    let host = roster(4, 2);
    let mut game = start(&host, ModeConfig::default(), 21);
    let striker2 = PlayerId(3); // team 2
    let striker3 = PlayerId(5); // team 3
    let striker4 = PlayerId(7); // team 4

    kill_vip_and_refill(&mut game, &host, TeamId(1), striker2);
    for _ in 0..2 {
        kill_vip_and_refill(&mut game, &host, TeamId(1), striker3);
    }
    for _ in 0..3 {
        kill_vip_and_refill(&mut game, &host, TeamId(1), striker4);
    }

    // Scores 2:1, 3:2, 4:3 and team 1 on zero; player 1 observes.
    game.on_player_deployed(PlayerId(1)).unwrap();

    let top = host.widget_info("vipfiesta_board_1_row_0").unwrap();
    assert_eq!(top.label, Some(Notice::BoardLine { team: TeamId(4), score: 3 }));
    let second = host.widget_info("vipfiesta_board_1_row_1").unwrap();
    assert_eq!(second.label, Some(Notice::BoardLine { team: TeamId(3), score: 2 }));
    let own = host.widget_info("vipfiesta_board_1_row_3").unwrap();
    assert_eq!(own.label, Some(Notice::BoardLine { team: TeamId(1), score: 0 }));
    assert!(host.widget_info("vipfiesta_board_1_row_4").is_none());
}

#[test]
fn test_intro_panel_shown_once_and_auto_hidden() {
    let host = roster(1, 1);
    let mut game = start(&host, ModeConfig::default(), 1);

    game.on_player_deployed(PlayerId(1)).unwrap();
    assert!(host.widget_info("vipfiesta_intro_1").unwrap().visible);

    // A redeploy during the display window schedules nothing new.
    game.on_player_deployed(PlayerId(1)).unwrap();
    assert_eq!(host.widget_count_named("vipfiesta_intro_1"), 1);

    host.advance(3.0);
    game.ongoing_player(PlayerId(1));
    assert!(!host.widget_info("vipfiesta_intro_1").unwrap().visible);

    // Later deploys leave the panel hidden.
    game.on_player_deployed(PlayerId(1)).unwrap();
    assert!(!host.widget_info("vipfiesta_intro_1").unwrap().visible);
}

#[test]
fn test_join_settles_before_roster_rescan() {
    let host = roster(1, 2);
    let mut game = start(&host, ModeConfig::default(), 4);
    assert_eq!(game.state().active_teams, vec![TeamId(1)]);

    host.add_player(PlayerId(9), "late", TeamId(2));
    host.deploy(PlayerId(9));
    game.on_player_join_game(PlayerId(9));
    // Not yet: the host may still be moving the newcomer between teams.
    assert_eq!(game.state().active_teams, vec![TeamId(1)]);

    host.advance(1.0);
    game.ongoing_player(PlayerId(1));
    assert_eq!(game.state().active_teams, vec![TeamId(1), TeamId(2)]);
    assert_eq!(game.state().vip_of(TeamId(2)), Some(PlayerId(9)));
}

#[test]
fn test_vip_switching_teams_vacates_old_slot() {
    let host = roster(2, 2);
    let mut game = start(&host, ModeConfig::default(), 6);
    let vip = game.state().vip_of(TeamId(1)).unwrap();
    let other = host.team_members(TeamId(1)).into_iter().find(|&p| p != vip).unwrap();
    let vip2 = game.state().vip_of(TeamId(2)).unwrap();

    host.switch_team(vip, TeamId(2));
    game.on_player_switch_team(vip, TeamId(2));

    assert_eq!(game.state().vip_of(TeamId(1)), Some(other));
    assert!(host.is_spotted(other));
    assert!(!host.is_spotted(vip));
    // The mover does not displace team 2's sitting VIP.
    assert_eq!(game.state().vip_of(TeamId(2)), Some(vip2));
}

#[test]
fn test_event_storm_never_yields_duplicate_vips() {
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;
    use std::collections::BTreeSet;

    let host = roster(3, 3);
    let mut game = start(&host, ModeConfig::default(), 99);
    let mut script = ChaCha8Rng::seed_from_u64(4242);

    for _ in 0..300 {
        let actor = PlayerId(script.gen_range(1..=9));
        match script.gen_range(0u8..4) {
            0 => {
                let killer = PlayerId(script.gen_range(1..=9));
                game.on_player_died(actor, killer).unwrap();
            }
            1 => game.ongoing_player(actor),
            2 => host.advance(script.gen_range(0.0..2.5)),
            _ => {
                let team = TeamId(script.gen_range(1..=3));
                host.switch_team(actor, team);
                game.on_player_switch_team(actor, team);
            }
        }
        if game.state().phase == MatchPhase::Ended {
            break;
        }

        // No player may hold more than one slot, and every sitting VIP is
        // on the team whose slot they hold.
        let mut holders = BTreeSet::new();
        for team in game.state().active_teams.clone() {
            if let Some(vip) = game.state().vip_of(team) {
                assert!(holders.insert(vip), "{} holds two slots", vip);
                assert_eq!(game.host().player_team(vip), Ok(team));
            }
        }
    }
}

#[test]
fn test_ring_patrol_runs_on_host_clock() {
    let host = SimHost::new();
    host.add_ring(1, Vec3::new(250.0, 10.0, 0.0));

    let mut patrol = RingPatrol::new(1);
    patrol.activate(&host);

    for _ in 0..10 {
        host.advance(2.0);
        patrol.update(&host, host.match_seconds());
    }

    // Drifted out past the bound, turned around, headed back.
    let x = host.ring_pos(1).unwrap().x;
    assert!(patrol.is_active());
    assert!(x <= 600.0);
    let moves = host
        .notifications()
        .iter()
        .filter(|(n, _)| *n == Notice::RingTestMoved)
        .count();
    assert_eq!(moves, 10);
}

#[cfg(all(test, feature = "proptest"))]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Any sequence of deaths and ticks leaves at most one slot per
        /// player.
        #[test]
        fn prop_no_player_holds_two_slots(
            seed in 0u64..1_000,
            events in prop::collection::vec((1u32..=6, 1u32..=6, 0.0f64..3.0), 0..40)
        ) {
            let host = roster(2, 3);
            let mut game = start(&host, ModeConfig::default(), seed);

            for (victim, killer, dt) in events {
                host.advance(dt);
                game.on_player_died(PlayerId(victim), PlayerId(killer)).unwrap();
                game.ongoing_player(PlayerId(killer));

                let mut holders = std::collections::BTreeSet::new();
                for team in game.state().active_teams.clone() {
                    if let Some(vip) = game.state().vip_of(team) {
                        prop_assert!(holders.insert(vip), "{} holds two slots", vip);
                    }
                }
            }
        }
    }
}
