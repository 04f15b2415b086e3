use radar_core::{Sector, SectorFilter};

use super::*;

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["radar-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_migrate_command() {
    let cli = Cli::try_parse_from(["radar-cli", "migrate"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Migrate)));
}

#[test]
fn seed_path_defaults_to_none() {
    let cli = Cli::try_parse_from(["radar-cli", "seed"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Seed { path: None })));
}

#[test]
fn seed_accepts_explicit_path() {
    let cli = Cli::try_parse_from(["radar-cli", "seed", "--path", "other.yaml"])
        .expect("expected valid cli args");
    match cli.command {
        Some(Commands::Seed { path: Some(path) }) => {
            assert_eq!(path, PathBuf::from("other.yaml"));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn partners_list_defaults_to_all_sectors() {
    let cli =
        Cli::try_parse_from(["radar-cli", "partners", "list"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Partners {
            command: PartnerCommands::List {
                sector: SectorFilter::All,
                search: None
            }
        })
    ));
}

#[test]
fn partners_list_parses_sector_and_search() {
    let cli = Cli::try_parse_from([
        "radar-cli", "partners", "list", "--sector", "Salud", "--search", "clinica",
    ])
    .expect("expected valid cli args");
    match cli.command {
        Some(Commands::Partners {
            command: PartnerCommands::List { sector, search },
        }) => {
            assert_eq!(sector, SectorFilter::Only(Sector::Health));
            assert_eq!(search.as_deref(), Some("clinica"));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn partners_list_rejects_unknown_sector() {
    let result = Cli::try_parse_from(["radar-cli", "partners", "list", "--sector", "Mining"]);
    assert!(result.is_err());
}

#[test]
fn partners_delete_requires_an_id() {
    assert!(Cli::try_parse_from(["radar-cli", "partners", "delete"]).is_err());

    let cli = Cli::try_parse_from(["radar-cli", "partners", "delete", "SLP-001"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Partners {
            command: PartnerCommands::Delete { ref id }
        }) if id == "SLP-001"
    ));
}

#[test]
fn parses_geocode_text() {
    let cli = Cli::try_parse_from(["radar-cli", "geocode", "Plaza de Armas"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Geocode { ref text }) if text == "Plaza de Armas"
    ));
}

#[test]
fn parses_upload_and_session() {
    let cli =
        Cli::try_parse_from(["radar-cli", "upload", "logo.png"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Upload { .. })));

    let cli = Cli::try_parse_from(["radar-cli", "session"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Session)));
}
