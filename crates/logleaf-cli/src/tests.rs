use chrono::{DateTime, Duration, TimeZone, Utc};
use clap::Parser;
use logleaf_core::db::SortKey;
use logleaf_core::sync::{ItemError, SyncFailure, SyncReport};
use logleaf_core::{Leaf, LeafError};
use pretty_assertions::assert_eq;

use crate::cli::{Cli, Commands, ListArgs, SortField};
use crate::commands::common::{
    format_leaf_lines, format_relative_time, leaf_to_list_item, normalize_leaf_identifier,
    note_preview, render_tags,
};
use crate::commands::list::list_options;
use crate::commands::sync::format_sync_report;
use crate::error::CliError;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

fn leaf(id: &str, note: &str, tags: &[&str], read: bool, age: Duration) -> Leaf {
    Leaf::reconstruct(
        id,
        note,
        format!("https://qiita.com/items/{id}"),
        "qiita",
        tags,
        read,
        now() - age,
    )
    .unwrap()
}

fn parse_list(args: &[&str]) -> ListArgs {
    let mut argv = vec!["logleaf", "list"];
    argv.extend_from_slice(args);
    match Cli::try_parse_from(argv).unwrap().command {
        Commands::List(args) => args,
        _ => panic!("expected list command"),
    }
}

#[test]
fn list_defaults_to_newest_first() {
    let options = list_options(&parse_list(&[]));

    assert_eq!(options.limit, 20);
    assert_eq!(options.offset, 0);
    assert_eq!(options.read, None);
    assert_eq!(options.sort_by, SortKey::SyncedAt);
    assert!(options.sort_desc);
}

#[test]
fn list_flags_map_to_options() {
    let args = parse_list(&[
        "--limit", "5", "--offset", "10", "--platform", "zenn", "--tag", "rust", "--unread",
        "--sort", "note", "--asc",
    ]);
    assert_eq!(args.sort, SortField::Note);

    let options = list_options(&args);
    assert_eq!(options.limit, 5);
    assert_eq!(options.offset, 10);
    assert_eq!(options.platform.as_deref(), Some("zenn"));
    assert_eq!(options.tag.as_deref(), Some("rust"));
    assert_eq!(options.read, Some(false));
    assert_eq!(options.sort_by, SortKey::Note);
    assert!(!options.sort_desc);
}

#[test]
fn add_collects_repeated_tags() {
    let cli = Cli::try_parse_from([
        "logleaf",
        "add",
        "https://zenn.dev/a",
        "--note",
        "Read later",
        "--tag",
        "rust",
        "--tag",
        "cli",
        "--db-path",
        "/tmp/leaves.db",
    ])
    .unwrap();

    assert_eq!(
        cli.db_path.as_deref(),
        Some(std::path::Path::new("/tmp/leaves.db"))
    );
    match cli.command {
        Commands::Add {
            url,
            note,
            platform,
            tags,
        } => {
            assert_eq!(url, "https://zenn.dev/a");
            assert_eq!(note, "Read later");
            assert_eq!(platform, "web");
            assert_eq!(tags, vec!["rust", "cli"]);
        }
        _ => panic!("expected add command"),
    }
}

#[test]
fn add_requires_note() {
    assert!(Cli::try_parse_from(["logleaf", "add", "https://zenn.dev/a"]).is_err());
}

#[test]
fn relative_time_buckets() {
    let now = now();
    assert_eq!(format_relative_time(now, now), "just now");
    assert_eq!(format_relative_time(now - Duration::minutes(5), now), "5m ago");
    assert_eq!(format_relative_time(now - Duration::hours(3), now), "3h ago");
    assert_eq!(format_relative_time(now - Duration::days(2), now), "2d ago");
    assert_eq!(format_relative_time(now - Duration::days(14), now), "2w ago");
    assert_eq!(format_relative_time(now - Duration::days(400), now), "1y ago");
    assert_eq!(format_relative_time(now + Duration::hours(1), now), "just now");
}

#[test]
fn note_preview_truncates_long_notes() {
    assert_eq!(note_preview("  short   note ", 40), "short note");
    assert_eq!(note_preview("abcdefghij", 8), "abcde...");
}

#[test]
fn leaf_lines_mark_unread_and_show_tags() {
    let leaves = [
        leaf("unread-leaf", "Unread", &["rust", "cli"], false, Duration::hours(2)),
        leaf("read-leaf", "Read", &[], true, Duration::days(1)),
    ];

    let lines = format_leaf_lines(&leaves, now());

    assert!(lines[0].starts_with("* unread-leaf"));
    assert!(lines[0].contains("2h ago"));
    assert!(lines[0].ends_with("#rust #cli"));
    assert!(lines[1].starts_with("  read-leaf"));
    assert!(lines[1].ends_with("1d ago"));
}

#[test]
fn leaf_list_item_serializes_all_fields() {
    let item = leaf_to_list_item(
        &leaf("abc", "Note", &["go"], false, Duration::minutes(1)),
        now(),
    );
    let json = serde_json::to_value(&item).unwrap();

    assert_eq!(json["id"], "abc");
    assert_eq!(json["url"], "https://qiita.com/items/abc");
    assert_eq!(json["platform"], "qiita");
    assert_eq!(json["tags"], serde_json::json!(["go"]));
    assert_eq!(json["read"], false);
    assert_eq!(json["relative_time"], "1m ago");
}

#[test]
fn tags_render_in_stored_order() {
    let item = leaf("abc", "Note", &["zeta", "alpha"], false, Duration::zero());
    assert_eq!(render_tags(&item), "#zeta #alpha");
}

#[test]
fn leaf_identifier_is_trimmed() {
    assert_eq!(normalize_leaf_identifier("  abc ").unwrap(), "abc");
    assert!(matches!(
        normalize_leaf_identifier("   "),
        Err(CliError::EmptyLeafId)
    ));
}

#[test]
fn sync_report_lists_skipped_items() {
    let report = SyncReport {
        pages: 1,
        fetched: 3,
        existing: 1,
        created: 1,
        failures: vec![SyncFailure {
            item_id: "bad".to_string(),
            url: "not a url".to_string(),
            error: ItemError::Invalid(LeafError::MalformedUrl("relative URL".to_string())),
        }],
    };

    let lines = format_sync_report(&report);
    assert_eq!(
        lines[0],
        "Synced 1 new leaves (3 fetched, 1 already stored, 1 failed)"
    );
    assert!(lines[1].contains("skipped bad (not a url)"));
}
