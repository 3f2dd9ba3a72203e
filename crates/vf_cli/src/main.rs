//! VIP Fiesta scripted-match runner.
//!
//! Builds a roster on the simulated host, replays a seeded random event
//! script through the controller and prints what a spectator would have
//! seen. Two runs with the same flags print the same match, which makes
//! this the quickest way to eyeball a rules change.

use anyhow::Result;
use clap::{Parser, Subcommand};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use vf_core::{Host, MatchPhase, ModeConfig, PlayerId, SimHost, TeamId, VipFiesta};

#[derive(Parser)]
#[command(name = "vf_cli")]
#[command(about = "Drive the VIP Fiesta rules engine against the simulated host", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a seeded random event script through a full match
    ScriptedMatch {
        /// Seed for the mode's VIP picks and the event script
        #[arg(long, default_value_t = 7)]
        seed: u64,

        /// Number of teams
        #[arg(long, default_value_t = 4)]
        teams: u32,

        /// Players per team
        #[arg(long, default_value_t = 3)]
        players_per_team: u32,

        /// VIP kills a team needs to win
        #[arg(long, default_value_t = 10)]
        target_kills: u32,

        /// Match length in seconds
        #[arg(long, default_value_t = 600)]
        time_limit: u32,

        /// Script length in events
        #[arg(long, default_value_t = 400)]
        events: u32,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::ScriptedMatch { seed, teams, players_per_team, target_kills, time_limit, events } => {
            run_scripted_match(seed, teams, players_per_team, target_kills, time_limit, events)
        }
    }
}

fn run_scripted_match(
    seed: u64,
    teams: u32,
    players_per_team: u32,
    target_kills: u32,
    time_limit: u32,
    events: u32,
) -> Result<()> {
    let mut cfg = ModeConfig::default();
    cfg.team_count = teams;
    cfg.target_vip_kills = target_kills;
    cfg.time_limit_secs = time_limit;

    println!("🎲 VIP Fiesta scripted match");
    println!("   Seed:    {}", seed);
    println!("   Teams:   {} x {} players", teams, players_per_team);
    println!("   Target:  {} VIP kills", target_kills);
    println!("   Limit:   {} s", time_limit);

    let host = SimHost::new();
    let mut connected: Vec<PlayerId> = Vec::new();
    let mut next_id = 1u32;
    for team in 1..=teams {
        for _ in 0..players_per_team {
            let player = PlayerId(next_id);
            host.add_player(player, &format!("player{}", next_id), TeamId(team));
            host.deploy(player);
            connected.push(player);
            next_id += 1;
        }
    }

    let mut game = VipFiesta::new(host.clone(), cfg, seed);
    game.initialize();
    log::debug!("roster ready: {} players", connected.len());
    let mut prev = snapshot(&game);

    println!("\n📜 Timeline");
    // Let the startup grace elapse so the first picks land.
    host.advance(6.0);
    game.ongoing_player(connected[0]);
    let opening = snapshot(&game);
    print_diff(&host, &prev, &opening);
    prev = opening;

    // Separate stream for the script, so the mode's own picks stay
    // untouched by how the match is driven.
    let mut script = ChaCha8Rng::seed_from_u64(seed ^ 0x5eed);

    for _ in 0..events {
        if game.state().phase == MatchPhase::Ended {
            break;
        }

        match script.gen_range(0u32..100) {
            // A kill somewhere on the map.
            0..=44 => {
                let victim = connected[script.gen_range(0..connected.len())];
                let killer = if script.gen_range(0u32..100) < 15 {
                    victim
                } else {
                    connected[script.gen_range(0..connected.len())]
                };
                let was_vip = !game.state().teams_with_vip(victim).is_empty();
                if was_vip {
                    println!(
                        "   t={:6.1}  💀 {} downs VIP {}",
                        host.match_seconds(),
                        describe(&host, killer),
                        describe(&host, victim)
                    );
                }
                game.on_player_died(victim, killer)?;
            }
            // A burst of per-player ticks.
            45..=64 => {
                for _ in 0..4 {
                    let player = connected[script.gen_range(0..connected.len())];
                    game.ongoing_player(player);
                }
            }
            // Time passes.
            65..=84 => {
                host.advance(script.gen_range(0.2..4.0));
                game.ongoing_player(connected[0]);
            }
            // Somebody switches sides.
            85..=91 => {
                let player = connected[script.gen_range(0..connected.len())];
                let team = TeamId(script.gen_range(1..=teams));
                println!(
                    "   t={:6.1}  🔀 {} moves to {}",
                    host.match_seconds(),
                    describe(&host, player),
                    team
                );
                host.switch_team(player, team);
                game.on_player_switch_team(player, team);
            }
            // Somebody rage-quits.
            92..=95 => {
                if connected.len() > teams as usize {
                    let idx = script.gen_range(0..connected.len());
                    let player = connected.swap_remove(idx);
                    println!(
                        "   t={:6.1}  🚪 {} leaves",
                        host.match_seconds(),
                        describe(&host, player)
                    );
                    host.remove_player(player);
                    game.on_player_leave_game(player);
                }
            }
            // A newcomer joins and deploys.
            _ => {
                let player = PlayerId(next_id);
                next_id += 1;
                let team = TeamId(script.gen_range(1..=teams));
                host.add_player(player, &format!("player{}", player.0), team);
                connected.push(player);
                game.on_player_join_game(player);
                host.deploy(player);
                game.on_player_deployed(player)?;
                println!(
                    "   t={:6.1}  👋 {} joins {}",
                    host.match_seconds(),
                    describe(&host, player),
                    team
                );
            }
        }

        if game.state().phase == MatchPhase::Running
            && host.match_seconds() >= f64::from(time_limit)
        {
            println!("   t={:6.1}  ⏱️  time limit reached", host.match_seconds());
            game.on_time_limit_reached();
        }

        let now = snapshot(&game);
        print_diff(&host, &prev, &now);
        prev = now;
    }

    // Script ran dry with no winner: blow the whistle.
    if game.state().phase == MatchPhase::Running {
        println!("   t={:6.1}  ⏱️  script over, calling the match", host.match_seconds());
        game.on_time_limit_reached();
    }

    print_standings(&game);
    print_host_summary(&host);
    verify_outcome(&game, &host)
}

/// Per-team score and VIP, for diff-based timeline printing.
type Snapshot = Vec<(TeamId, u32, Option<PlayerId>)>;

fn snapshot(game: &VipFiesta<SimHost>) -> Snapshot {
    game.state()
        .active_teams
        .iter()
        .map(|&team| (team, game.state().score(team), game.state().vip_of(team)))
        .collect()
}

fn print_diff(host: &SimHost, prev: &Snapshot, now: &Snapshot) {
    for &(team, score, vip) in now {
        let old = prev.iter().find(|(t, _, _)| *t == team);
        let (old_score, old_vip) = match old {
            Some(&(_, s, v)) => (s, v),
            None => {
                println!("   t={:6.1}  🟢 {} enters the match", host.match_seconds(), team);
                (0, None)
            }
        };
        if score != old_score {
            println!("   t={:6.1}  🎯 {} scores ({} total)", host.match_seconds(), team, score);
        }
        if vip != old_vip {
            match vip {
                Some(player) => println!(
                    "   t={:6.1}  👑 {} is the new VIP of {}",
                    host.match_seconds(),
                    describe(host, player),
                    team
                ),
                None => println!("   t={:6.1}  ❔ {} has no VIP", host.match_seconds(), team),
            }
        }
    }
}

fn describe(host: &SimHost, player: PlayerId) -> String {
    match host.player_team(player) {
        Ok(team) => format!("{} ({})", host.player_name(player), team),
        Err(_) => host.player_name(player),
    }
}

fn print_standings(game: &VipFiesta<SimHost>) {
    let state = game.state();
    let mut ranked: Vec<TeamId> = state.active_teams.clone();
    ranked.sort_by(|a, b| state.score(*b).cmp(&state.score(*a)).then(a.cmp(b)));

    println!("\n🏁 Final standings");
    for (idx, &team) in ranked.iter().enumerate() {
        let score = state.score(team);
        let bar_len = (score as usize).min(40);
        println!("   {:>2}. {}  {:>3}  {}", idx + 1, team, score, "#".repeat(bar_len));
    }
}

fn print_host_summary(host: &SimHost) {
    println!("\n📊 Host calls");
    println!("   Duration:        {:.1} s", host.match_seconds());
    println!("   Notifications:   {}", host.notifications().len());
    println!("   World log lines: {}", host.world_log().len());
    println!("   Spot refreshes:  {}", host.spot_events());
    println!("   Live widgets:    {}", host.live_widgets());
}

/// Cross-check the finished match; any violation here is a rules bug.
fn verify_outcome(game: &VipFiesta<SimHost>, host: &SimHost) -> Result<()> {
    let state = game.state();

    if state.phase != MatchPhase::Ended {
        anyhow::bail!("❌ script finished but the match never ended");
    }
    let Some(winner) = host.round_winner() else {
        anyhow::bail!("❌ match ended without a declared winner");
    };

    let target = game.config().target_vip_kills;
    let best = state.active_teams.iter().map(|&t| state.score(t)).max().unwrap_or(0);
    let winner_score = state.score(winner);
    if winner_score < target && winner_score != best {
        anyhow::bail!(
            "❌ winner {} has {} kills but the best active score is {}",
            winner,
            winner_score,
            best
        );
    }
    for (&team, &score) in &state.team_scores {
        if score > target {
            anyhow::bail!("❌ {} overshot the target: {} > {}", team, score, target);
        }
    }

    let mut holders = std::collections::BTreeSet::new();
    for &team in &state.active_teams {
        if let Some(vip) = state.vip_of(team) {
            if !holders.insert(vip) {
                anyhow::bail!("❌ {} holds two VIP slots", vip);
            }
        }
    }

    println!("\n✅ Match consistent: {} wins with {} VIP kills", winner, winner_score);
    Ok(())
}
