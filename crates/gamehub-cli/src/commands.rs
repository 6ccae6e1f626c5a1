//! Subcommand implementations

use anyhow::{Result, bail};
use gamehub_library::{
    GameDatabase, GameRecord, Library, LibraryError, PlatformEntry, ScanContext, SyncReport,
};

type GameLibrary = Library<GameDatabase>;

fn print_game(game: &GameRecord, platform: &str) {
    let mut flags = String::new();
    if game.favourite {
        flags.push_str(" *");
    }
    if !game.installed {
        flags.push_str(" (not installed)");
    }
    println!(
        "  {:<40} {:<10} {:<12} {}{}",
        game.title, platform, game.tag, game.external_id, flags
    );
}

fn platform_name(library: &GameLibrary, id: i64) -> &str {
    library.platform(id).map(|p| p.name()).unwrap_or("?")
}

fn print_report(name: &str, report: &SyncReport) {
    println!(
        "{}: {} added, {} removed, {} failed",
        name,
        report.added.len(),
        report.removed.len(),
        report.failures.len()
    );
    for failure in &report.failures {
        println!("  ! {}: {}", failure.game, failure.cause);
    }
}

pub fn platforms(library: &GameLibrary) -> Result<()> {
    println!("{:>4}  {:<12} {:>6}  STATUS", "ID", "NAME", "GAMES");
    for entry in library.entries() {
        let status = match entry {
            PlatformEntry::Real(p) if p.is_enabled() => "enabled",
            PlatformEntry::Real(_) => "disabled",
            PlatformEntry::Derived(_) => "derived",
        };
        println!(
            "{:>4}  {:<12} {:>6}  {}",
            entry.id(),
            entry.name(),
            entry.game_count(),
            status
        );
    }
    Ok(())
}

pub async fn scan(
    library: &mut GameLibrary,
    platform: Option<&str>,
    ctx: &ScanContext,
) -> Result<()> {
    match platform {
        Some(name) => match library.scan_platform(name, ctx) {
            Ok(report) => print_report(name, &report),
            Err(LibraryError::Cancelled) => println!("{}: scan cancelled", name),
            Err(e) => return Err(e.into()),
        },
        None => {
            let mut failed = 0;
            for outcome in library.scan_all(ctx).await {
                match &outcome.result {
                    Ok(report) => print_report(&outcome.platform, report),
                    Err(LibraryError::Cancelled) => {
                        println!("{}: scan cancelled", outcome.platform)
                    }
                    Err(e) => {
                        failed += 1;
                        println!("{}: {}", outcome.platform, e);
                    }
                }
            }
            if failed > 0 {
                bail!("{} platform scan(s) failed", failed);
            }
        }
    }
    Ok(())
}

pub fn list(library: &GameLibrary, platform: Option<&str>, tag: Option<&str>) -> Result<()> {
    let platforms: Vec<_> = match platform {
        Some(name) => match library.platform_by_name(name) {
            Some(p) => vec![p],
            None => bail!("Unknown platform {}", name),
        },
        None => library.platforms().iter().collect(),
    };

    let mut total = 0;
    for platform in platforms {
        let mut games: Vec<&GameRecord> = match tag {
            Some(tag) => platform
                .games()
                .get(tag)
                .map(|set| set.iter().collect())
                .unwrap_or_default(),
            None => platform.games().iter_games().collect(),
        };
        games.sort_by(|a, b| a.title.cmp(&b.title));

        for game in &games {
            print_game(game, platform.name());
        }
        total += games.len();
    }

    println!("{} game(s)", total);
    Ok(())
}

pub fn search(library: &mut GameLibrary, term: &str) -> Result<()> {
    let results: Vec<GameRecord> = library.search(term).to_vec();
    for game in &results {
        print_game(game, platform_name(library, game.platform_id));
    }
    println!("{} match(es) for '{}'", results.len(), term);
    Ok(())
}

pub fn favourites(library: &GameLibrary) -> Result<()> {
    let favourites = library.favourites().sorted();
    for game in &favourites {
        print_game(game, platform_name(library, game.platform_id));
    }
    println!("{} favourite(s)", favourites.len());
    Ok(())
}
