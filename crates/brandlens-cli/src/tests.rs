use super::*;
use crate::analyze::StrategyArg;
use brandlens_analyzer::Workflow;
use brandlens_core::CategoryCounts;

fn analyze_args(args: &[&str]) -> AnalyzeArgs {
    let argv = ["brandlens", "analyze"].iter().chain(args.iter()).copied();
    match Cli::try_parse_from(argv).expect("expected valid cli args").command {
        Some(Commands::Analyze(args)) => args,
        other => panic!("expected analyze command, got {other:?}"),
    }
}

#[test]
fn parses_db_ping_command() {
    let cli = Cli::try_parse_from(["brandlens", "db", "ping"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Ping
        })
    ));
}

#[test]
fn parses_db_migrate_command() {
    let cli =
        Cli::try_parse_from(["brandlens", "db", "migrate"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Db {
            command: DbCommands::Migrate
        })
    ));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["brandlens"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn site_add_defaults_language_and_description() {
    let cli = Cli::try_parse_from([
        "brandlens",
        "site",
        "add",
        "--owner",
        "42",
        "--name",
        "Acme Tools",
        "--url",
        "https://www.acme-tools.io",
    ])
    .expect("expected valid cli args");

    match cli.command {
        Some(Commands::Site {
            command:
                SiteCommands::Add {
                    owner,
                    name,
                    url,
                    description,
                    language,
                },
        }) => {
            assert_eq!(owner, 42);
            assert_eq!(name, "Acme Tools");
            assert_eq!(url, "https://www.acme-tools.io");
            assert_eq!(description, "");
            assert_eq!(language, "en");
        }
        other => panic!("expected site add, got {other:?}"),
    }
}

#[test]
fn site_add_requires_url() {
    let result = Cli::try_parse_from(["brandlens", "site", "add", "--owner", "1", "--name", "x"]);
    assert!(result.is_err());
}

#[test]
fn analyze_defaults_to_multi_call_with_one_query_each() {
    let args = analyze_args(&["--owner", "42", "--url", "https://www.acme-tools.io"]);

    assert_eq!(args.strategy, StrategyArg::Multi);
    assert_eq!(args.retries, 0);
    assert_eq!(
        args.workflow(),
        Workflow::MultiCall(CategoryCounts::default())
    );
}

#[test]
fn analyze_floors_non_positive_counts() {
    let args = analyze_args(&[
        "--owner",
        "42",
        "--url",
        "https://www.acme-tools.io",
        "--direct",
        "3",
        "--intermediate",
        "0",
        "--indirect",
        "-2",
    ]);

    assert_eq!(
        args.workflow(),
        Workflow::MultiCall(CategoryCounts {
            direct: 3,
            intermediate: 1,
            indirect: 1,
        })
    );
}

#[test]
fn analyze_single_strategy_ignores_counts() {
    let args = analyze_args(&[
        "--owner",
        "42",
        "--url",
        "https://www.acme-tools.io",
        "--strategy",
        "single",
        "--direct",
        "5",
        "--retries",
        "2",
    ]);

    assert_eq!(args.strategy, StrategyArg::Single);
    assert_eq!(args.retries, 2);
    assert_eq!(args.workflow(), Workflow::SingleCall);
}

#[test]
fn analyze_rejects_unknown_strategy() {
    let result = Cli::try_parse_from([
        "brandlens",
        "analyze",
        "--owner",
        "1",
        "--url",
        "https://acme.io",
        "--strategy",
        "batch",
    ]);
    assert!(result.is_err());
}

#[test]
fn parses_history_and_show() {
    let history = Cli::try_parse_from(["brandlens", "history", "--owner", "42", "--site-id", "7"])
        .expect("expected valid cli args");
    assert!(matches!(
        history.command,
        Some(Commands::History {
            owner: 42,
            site_id: 7
        })
    ));

    let show = Cli::try_parse_from(["brandlens", "show", "--owner", "42", "--id", "3"])
        .expect("expected valid cli args");
    assert!(matches!(
        show.command,
        Some(Commands::Show { owner: 42, id: 3 })
    ));
}

#[test]
fn site_profile_trims_and_validates() {
    let profile = site::site_profile(" Acme Tools ", " https://acme-tools.io ", " Tools ", " ")
        .expect("valid profile");
    assert_eq!(profile.name, "Acme Tools");
    assert_eq!(profile.url, "https://acme-tools.io");
    assert_eq!(profile.description, "Tools");
    assert_eq!(profile.language, "en");

    assert!(site::site_profile("", "https://acme-tools.io", "", "en").is_err());
    assert!(site::site_profile("Acme", "   ", "", "en").is_err());
}

#[test]
fn score_lines_list_every_category() {
    let scores = brandlens_core::ScoreSet {
        direct: 80.0,
        intermediate: 45.5,
        indirect: 0.0,
        visibility: 53.5,
    };
    assert_eq!(
        analyze::score_lines(&scores),
        vec![
            "visibility:    53.5",
            "  direct:       80.0",
            "  intermediate: 45.5",
            "  indirect:     0.0",
        ]
    );
}
