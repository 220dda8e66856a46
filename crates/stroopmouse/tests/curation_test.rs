//! Integration tests for dataset curation and curation sessions.

mod common;

use std::cell::RefCell;
use std::fs;
use std::rc::Rc;
use std::sync::Arc;

use common::{Fixture, frozen_clock};
use stroopmouse::session::{Command, CurationSession, Outcome};
use stroopmouse::{
    ArrayData, Dataset, FsRepository, HierarchicalStore, MemoryStore, StoreMode,
    StroopmouseError,
};

fn open(fixture: &Fixture, name: &str) -> Dataset {
    Dataset::open(fixture.dataset_path(name), StoreMode::Append, fixture.repo())
        .expect("Failed to open dataset")
        .with_clock(frozen_clock())
}

fn messages(dataset: &Dataset) -> Vec<String> {
    dataset
        .activity_log()
        .entries()
        .map(|e| e.message)
        .collect()
}

// =============================================================================
// Mouse Selection Tests
// =============================================================================

#[test]
fn test_available_mice_skip_ignored_entries() {
    let fixture = Fixture::standard();
    let dataset = open(&fixture, "d");

    assert_eq!(dataset.available_mice(), &["101", "205"]);
}

#[test]
fn test_add_mouse_is_idempotent() {
    let fixture = Fixture::standard();
    let mut dataset = open(&fixture, "d");

    assert!(dataset.add_mouse("101").unwrap());
    assert!(!dataset.add_mouse("101").unwrap());

    assert_eq!(dataset.mouse_ids(), vec!["101"]);
    assert_eq!(messages(&dataset), vec!["Added mouse 101"]);

    let groups = dataset.store().list_groups("");
    assert_eq!(groups.iter().filter(|g| g.as_str() == "101").count(), 1);
}

#[test]
fn test_add_unknown_mouse_is_recoverable() {
    let fixture = Fixture::standard();
    let mut dataset = open(&fixture, "d");

    let err = dataset.add_mouse("test").unwrap_err();
    assert!(matches!(err, StroopmouseError::UnknownMouse(ref id) if id == "test"));
    assert!(err.is_recoverable());
    assert!(dataset.activity_log().is_empty());
    assert!(!dataset.store().contains_group("test"));
}

#[test]
fn test_remove_mouse_removes_subtree_with_one_log_entry() {
    let fixture = Fixture::standard();
    let mut dataset = open(&fixture, "d");
    dataset.add_mouse("101").unwrap();
    dataset
        .mouse_mut("101")
        .unwrap()
        .date_range("2023-01-02", "2023-01-03")
        .unwrap();
    let before = dataset.activity_log().len();

    assert!(dataset.remove_mouse("101").unwrap());

    assert_eq!(dataset.activity_log().len(), before + 1);
    assert_eq!(messages(&dataset).last().unwrap(), "Removed mouse 101");
    assert!(!dataset.store().contains_group("101"));
    assert!(!dataset.store().contains_group("101/2023-01-02"));
    assert!(dataset.mice().is_empty());

    assert!(!dataset.remove_mouse("101").unwrap());
}

// =============================================================================
// Date Selection Tests
// =============================================================================

#[test]
fn test_available_dates_skip_non_date_directories() {
    let fixture = Fixture::standard();
    let mut dataset = open(&fixture, "d");
    dataset.add_mouse("101").unwrap();

    let mouse = dataset.mouse("101").unwrap();
    let dates: Vec<&str> = mouse.list_available_dates().collect();
    assert_eq!(dates, vec!["2023-01-02", "2023-01-03", "2023-01-04", "2023-01-05"]);

    // A second pass yields the same dates.
    assert_eq!(mouse.list_available_dates().count(), 4);
}

#[test]
fn test_add_date_twice_replaces_block_selection() {
    let fixture = Fixture::standard();
    let mut dataset = open(&fixture, "d");
    dataset.add_mouse("101").unwrap();

    let mut mouse = dataset.mouse_mut("101").unwrap();
    mouse
        .add_date("2023-01-02")
        .unwrap()
        .add_block_numbers(&['1', '2'])
        .unwrap();
    mouse
        .add_date("2023-01-02")
        .unwrap()
        .add_block_numbers(&['2'])
        .unwrap();

    let date = dataset.mouse("101").unwrap().date("2023-01-02").unwrap();
    assert_eq!(date.selected_blocks(), &['2']);
    assert_eq!(
        dataset.store().array("101/2023-01-02/blocks"),
        Some(ArrayData::Text(vec!["2".to_string()]))
    );
    assert_eq!(dataset.mouse("101").unwrap().selected_dates(), vec!["2023-01-02"]);
}

#[test]
fn test_add_date_without_blocks_starts_empty() {
    let fixture = Fixture::standard();
    let mut dataset = open(&fixture, "d");
    dataset.add_mouse("101").unwrap();

    let mut mouse = dataset.mouse_mut("101").unwrap();
    let editor = mouse.add_date("2023-01-05").unwrap();
    assert!(editor.date().selected_blocks().is_empty());
    assert_eq!(editor.date().available_block_numbers(), &['1', '2', '3']);
}

#[test]
fn test_add_unknown_date() {
    let fixture = Fixture::standard();
    let mut dataset = open(&fixture, "d");
    dataset.add_mouse("101").unwrap();

    let result = dataset.mouse_mut("101").unwrap().add_date("2023-03-01").map(|_| ());
    assert!(matches!(result, Err(StroopmouseError::UnknownDate { .. })));
}

#[test]
fn test_date_range_is_inclusive_and_ordered() {
    let fixture = Fixture::standard();
    let mut dataset = open(&fixture, "d");
    dataset.add_mouse("101").unwrap();

    let added = dataset
        .mouse_mut("101")
        .unwrap()
        .date_range("2023-01-02", "2023-01-04")
        .unwrap();

    assert_eq!(added, vec!["2023-01-02", "2023-01-03", "2023-01-04"]);
    assert_eq!(
        dataset.mouse("101").unwrap().selected_dates(),
        vec!["2023-01-02", "2023-01-03", "2023-01-04"]
    );
    assert!(messages(&dataset).contains(&"Added 2023-01-04".to_string()));
}

#[test]
fn test_date_range_endpoint_must_exist() {
    let fixture = Fixture::standard();
    let mut dataset = open(&fixture, "d");
    dataset.add_mouse("101").unwrap();

    let err = dataset
        .mouse_mut("101")
        .unwrap()
        .date_range("2023-01-02", "2023-01-31")
        .unwrap_err();
    assert!(matches!(err, StroopmouseError::DateNotFound { ref date, .. } if date == "2023-01-31"));
    assert!(dataset.mouse("101").unwrap().selected_dates().is_empty());
}

#[test]
fn test_inverted_date_range_adds_nothing() {
    let fixture = Fixture::standard();
    let mut dataset = open(&fixture, "d");
    dataset.add_mouse("101").unwrap();

    let added = dataset
        .mouse_mut("101")
        .unwrap()
        .date_range("2023-01-05", "2023-01-02")
        .unwrap();
    assert!(added.is_empty());
}

#[test]
fn test_remove_date_is_logged() {
    let fixture = Fixture::standard();
    let mut dataset = open(&fixture, "d");
    dataset.add_mouse("101").unwrap();

    let mut mouse = dataset.mouse_mut("101").unwrap();
    mouse.add_date("2023-01-02").unwrap();
    assert!(mouse.remove_date("2023-01-02").unwrap());
    assert!(!mouse.remove_date("2023-01-02").unwrap());

    assert_eq!(messages(&dataset).last().unwrap(), "Removed 2023-01-02");
    assert!(!dataset.store().contains_group("101/2023-01-02"));
}

// =============================================================================
// Block Selection Tests
// =============================================================================

#[test]
fn test_add_blocks_deduplicates_and_logs_each_block() {
    let fixture = Fixture::standard();
    let mut dataset = open(&fixture, "d");
    dataset.add_mouse("101").unwrap();

    let selected = dataset
        .mouse_mut("101")
        .unwrap()
        .add_date("2023-01-05")
        .unwrap()
        .add_blocks(&[
            "ms101_2023-01-05_block3.json",
            "ms101_2023-01-05_block1.json",
            "ms101_2023-01-05_block3.json",
        ])
        .unwrap();

    assert_eq!(selected, vec!['3', '1']);
    let log = messages(&dataset);
    assert_eq!(
        &log[log.len() - 2..],
        &[
            "Added ms101_2023-01-05_block3.json".to_string(),
            "Added ms101_2023-01-05_block1.json".to_string(),
        ]
    );
}

#[test]
fn test_add_unknown_block() {
    let fixture = Fixture::standard();
    let mut dataset = open(&fixture, "d");
    dataset.add_mouse("101").unwrap();

    let mut mouse = dataset.mouse_mut("101").unwrap();
    let mut date = mouse.add_date("2023-01-02").unwrap();
    assert!(matches!(
        date.add_block_numbers(&['7']),
        Err(StroopmouseError::UnknownBlock { .. })
    ));
    assert!(date.date().selected_blocks().is_empty());
}

#[test]
fn test_quality_flag() {
    let fixture = Fixture::standard();
    let mut dataset = open(&fixture, "d");
    dataset.add_mouse("101").unwrap();

    let mut mouse = dataset.mouse_mut("101").unwrap();
    let flagged = mouse
        .add_date("2023-01-04")
        .unwrap()
        .check_quality_flag("ms101_2023-01-04_block1.json")
        .unwrap();
    assert!(flagged.requires_confirmation);
    assert_eq!(flagged.message.as_deref(), Some("lick port clogged"));

    let clean = mouse
        .add_date("2023-01-03")
        .unwrap()
        .check_quality_flag("ms101_2023-01-03_block1.json")
        .unwrap();
    assert!(!clean.requires_confirmation);
    assert_eq!(clean.message, None);
}

#[test]
fn test_list_protocols_reads_last_block() {
    let fixture = Fixture::standard();
    let mut dataset = open(&fixture, "d");
    dataset.add_mouse("101").unwrap();

    let protocols = dataset
        .mouse("101")
        .unwrap()
        .list_protocols(dataset.repository())
        .unwrap();

    assert_eq!(protocols.len(), 4);
    assert_eq!(protocols[0].date, "2023-01-02");
    assert_eq!(protocols[0].protocol.as_deref(), Some("stroop_v1"));
}

// =============================================================================
// Activity Log Tests
// =============================================================================

#[test]
fn test_same_second_entries_get_distinct_keys() {
    let fixture = Fixture::standard();
    let mut dataset = open(&fixture, "d");

    dataset.add_mouse("101").unwrap();
    dataset.add_mouse("205").unwrap();

    let keys: Vec<String> = dataset.activity_log().entries().map(|e| e.key).collect();
    assert_eq!(
        keys,
        vec!["2023-01-02 12:00:00 (000)", "2023-01-02 12:00:00 (001)"]
    );
}

#[test]
fn test_reopened_dataset_never_overwrites_log_entries() {
    let fixture = Fixture::standard();
    {
        let mut dataset = open(&fixture, "d");
        dataset.add_mouse("101").unwrap();
        dataset.flush().unwrap();
    }

    let mut dataset = open(&fixture, "d");
    assert_eq!(dataset.activity_log().session_counter(), 0);
    dataset.add_mouse("205").unwrap();

    let log = dataset.activity_log();
    assert_eq!(log.len(), 2);
    assert_eq!(log.get("2023-01-02 12:00:00 (000)"), Some("Added mouse 101"));
    assert_eq!(log.get("2023-01-02 12:00:00 (001)"), Some("Added mouse 205"));
}

#[test]
fn test_data_is_written_before_log() {
    let fixture = Fixture::standard();
    // One write for the log group, one for the mouse group, none for the entry.
    let store = MemoryStore::new().with_write_budget(2);
    let mut dataset = Dataset::from_store(Box::new(store), fixture.repo()).unwrap();

    let err = dataset.add_mouse("101").unwrap_err();

    assert!(matches!(err, StroopmouseError::StoreWriteFailed(_)));
    assert!(!err.is_recoverable());
    assert!(dataset.store().contains_group("101"));
    assert!(dataset.activity_log().is_empty());
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_selection_survives_reopen() {
    let fixture = Fixture::standard();
    {
        let mut dataset = open(&fixture, "d");
        dataset.add_mouse("101").unwrap();
        dataset
            .mouse_mut("101")
            .unwrap()
            .add_date("2023-01-05")
            .unwrap()
            .add_block_numbers(&['2', '3'])
            .unwrap();
    }

    let dataset = Dataset::open(fixture.dataset_path("d"), StoreMode::ReadOnly, fixture.repo())
        .unwrap();
    let mouse = dataset.mouse("101").unwrap();
    assert_eq!(mouse.selected_dates(), vec!["2023-01-05"]);
    assert_eq!(mouse.date("2023-01-05").unwrap().selected_blocks(), &['2', '3']);
    assert_eq!(mouse.block_count(), 2);
}

#[test]
fn test_read_only_dataset_rejects_writes() {
    let fixture = Fixture::standard();
    open(&fixture, "d").flush().unwrap();

    let mut dataset =
        Dataset::open(fixture.dataset_path("d"), StoreMode::ReadOnly, fixture.repo()).unwrap();

    assert!(matches!(
        dataset.add_mouse("101"),
        Err(StroopmouseError::StoreWriteFailed(_))
    ));
    assert!(dataset.mice().is_empty());
}

#[test]
fn test_read_only_dataset_opens_without_raw_repository() {
    let fixture = Fixture::standard();
    {
        let mut dataset = open(&fixture, "d");
        dataset.add_mouse("101").unwrap();
        dataset
            .mouse_mut("101")
            .unwrap()
            .add_date("2023-01-05")
            .unwrap()
            .add_block_numbers(&['1'])
            .unwrap();
    }

    let missing = Arc::new(FsRepository::new(fixture.raw().join("moved")));
    let dataset = Dataset::open(fixture.dataset_path("d"), StoreMode::ReadOnly, missing).unwrap();

    assert!(dataset.available_mice().is_empty());
    let mouse = dataset.mouse("101").unwrap();
    assert_eq!(mouse.list_available_dates().count(), 0);
    assert_eq!(mouse.date("2023-01-05").unwrap().selected_blocks(), &['1']);
    assert_eq!(dataset.activity_log().len(), 3);
}

#[test]
fn test_mouse_deleted_from_raw_repository_can_be_removed() {
    let fixture = Fixture::standard();
    {
        let mut dataset = open(&fixture, "d");
        dataset.add_mouse("205").unwrap();
        dataset.mouse_mut("205").unwrap().add_date("2023-02-01").unwrap();
    }
    fs::remove_dir_all(fixture.raw().join("205")).unwrap();

    let mut dataset = open(&fixture, "d");
    assert_eq!(dataset.mouse_ids(), vec!["205"]);
    assert!(dataset.remove_mouse("205").unwrap());
    assert!(!dataset.store().contains_group("205"));
}

#[test]
fn test_append_mode_needs_raw_repository() {
    let fixture = Fixture::standard();
    let missing = Arc::new(FsRepository::new(fixture.raw().join("moved")));

    let result = Dataset::open(fixture.dataset_path("d"), StoreMode::Append, missing);
    assert!(matches!(result, Err(StroopmouseError::Io { .. })));
}

#[test]
fn test_read_only_missing_dataset_is_unavailable() {
    let fixture = Fixture::standard();
    let result = Dataset::open(fixture.dataset_path("nope"), StoreMode::ReadOnly, fixture.repo());
    assert!(matches!(result, Err(StroopmouseError::StoreUnavailable { .. })));
}

#[test]
fn test_create_refuses_existing_dataset() {
    let fixture = Fixture::standard();
    open(&fixture, "d");

    let result = Dataset::create(fixture.dataset_path("d"), fixture.repo());
    assert!(matches!(result, Err(StroopmouseError::StoreUnavailable { .. })));
}

// =============================================================================
// Curation Session Tests
// =============================================================================

#[test]
fn test_session_logs_user_message() {
    let fixture = Fixture::standard();
    let session = CurationSession::begin(open(&fixture, "d"), "first week").unwrap();

    assert_eq!(messages(session.dataset()), vec!["User Message: first week"]);
}

#[test]
fn test_session_add_date_selects_single_block() {
    let fixture = Fixture::standard();
    let mut session = CurationSession::new(open(&fixture, "d"));

    session.execute_line("add-mouse 101").unwrap();
    let outcome = session.execute_line("add-date 101 2023-01-03").unwrap();
    assert!(matches!(outcome, Outcome::Changed(_)));

    let listed = session.execute_line("lsf-blocks 101 2023-01-03").unwrap();
    assert_eq!(listed, Outcome::Listing(vec!["1".to_string()]));

    // Multi-block dates start empty.
    session.execute_line("add-date 101 2023-01-05").unwrap();
    assert_eq!(
        session.execute_line("lsf-blocks 101 2023-01-05").unwrap(),
        Outcome::Listing(vec![])
    );
}

#[test]
fn test_session_range_selects_blocks_like_add_date() {
    let fixture = Fixture::standard();

    let mut ranged = CurationSession::new(open(&fixture, "ranged"));
    ranged.execute_line("add-mouse 101").unwrap();
    ranged.execute_line("range 101 2023-01-02 2023-01-05").unwrap();

    let mut single = CurationSession::new(open(&fixture, "single"));
    single.execute_line("add-mouse 101").unwrap();
    for date in ["2023-01-02", "2023-01-03", "2023-01-04", "2023-01-05"] {
        single.execute_line(&format!("add-date 101 {date}")).unwrap();
    }

    for date in ["2023-01-02", "2023-01-03", "2023-01-04", "2023-01-05"] {
        let line = format!("lsf-blocks 101 {date}");
        assert_eq!(
            ranged.execute_line(&line).unwrap(),
            single.execute_line(&line).unwrap(),
            "{date}"
        );
    }
    assert_eq!(
        ranged.execute_line("lsf-blocks 101 2023-01-03").unwrap(),
        Outcome::Listing(vec!["1".to_string()])
    );
    // Flagged single blocks still go through the confirmer.
    assert_eq!(
        ranged.execute_line("lsf-blocks 101 2023-01-04").unwrap(),
        Outcome::Listing(vec![])
    );
}

#[test]
fn test_session_declines_flagged_block_by_default() {
    let fixture = Fixture::standard();
    let mut session = CurationSession::new(open(&fixture, "d"));

    session.execute_line("add-mouse 101").unwrap();
    session.execute_line("add-date 101 2023-01-04").unwrap();

    assert_eq!(
        session.execute_line("lsf-blocks 101 2023-01-04").unwrap(),
        Outcome::Listing(vec![])
    );
}

#[test]
fn test_session_confirmer_sees_flagged_block() {
    let fixture = Fixture::standard();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let mut session = CurationSession::new(open(&fixture, "d")).with_confirmer(move |flag| {
        sink.borrow_mut().push(flag.message.clone().unwrap_or_default());
        true
    });

    session.execute_line("add-mouse 101").unwrap();
    session.execute_line("add-date 101 2023-01-04").unwrap();
    session.execute_line("add-date 101 2023-01-03").unwrap();

    assert_eq!(*seen.borrow(), vec!["lick port clogged".to_string()]);
    assert_eq!(
        session.execute_line("lsf-blocks 101 2023-01-04").unwrap(),
        Outcome::Listing(vec!["1".to_string()])
    );
}

#[test]
fn test_session_listings() {
    let fixture = Fixture::standard();
    let mut session = CurationSession::new(open(&fixture, "d"));

    assert_eq!(
        session.execute(Command::ListMice).unwrap(),
        Outcome::Listing(vec!["101".to_string(), "205".to_string()])
    );

    session.execute_line("add-mouse 101").unwrap();
    session.execute_line("range 101 2023-01-02 2023-01-03").unwrap();

    assert_eq!(
        session.execute_line("lsf").unwrap(),
        Outcome::Listing(vec!["101".to_string()])
    );
    assert_eq!(
        session.execute_line("lsf-dates 101").unwrap(),
        Outcome::Listing(vec!["2023-01-02".to_string(), "2023-01-03".to_string()])
    );
    assert_eq!(
        session.execute_line("ls-blocks 101 2023-01-02").unwrap(),
        Outcome::Listing(vec!["1".to_string(), "2".to_string()])
    );

    let Outcome::Listing(protocols) = session.execute_line("lsp 101").unwrap() else {
        panic!("expected a listing");
    };
    assert_eq!(protocols[0], "2023-01-02: stroop_v1");
}

#[test]
fn test_session_blocks_command() {
    let fixture = Fixture::standard();
    let mut session = CurationSession::new(open(&fixture, "d"));

    session.execute_line("add-mouse 101").unwrap();
    session.execute_line("add-date 101 2023-01-05").unwrap();
    session.execute_line("blocks 101 2023-01-05 3 1").unwrap();

    assert_eq!(
        session.execute_line("lsf-blocks 101 2023-01-05").unwrap(),
        Outcome::Listing(vec!["3".to_string(), "1".to_string()])
    );
    assert!(matches!(
        session.execute_line("blocks 101 2023-01-05 9"),
        Err(StroopmouseError::UnknownBlock { .. })
    ));
    assert!(matches!(
        session.execute_line("blocks 101 2023-01-02 1"),
        Err(StroopmouseError::UnknownDate { .. })
    ));
}

#[test]
fn test_session_errors_leave_session_usable() {
    let fixture = Fixture::standard();
    let mut session = CurationSession::new(open(&fixture, "d"));

    let err = session.execute_line("add-mouse").unwrap_err();
    assert!(err.is_recoverable());
    let err = session.execute_line("add-date 999 2023-01-02").unwrap_err();
    assert!(err.is_recoverable());

    assert!(matches!(session.execute_line("add-mouse 101").unwrap(), Outcome::Changed(_)));
    assert_eq!(session.execute_line("quit").unwrap(), Outcome::Quit);
}

#[test]
fn test_session_finish_flushes() {
    let fixture = Fixture::standard();
    let mut session = CurationSession::begin(open(&fixture, "d"), "note").unwrap();
    session.execute_line("add-mouse 205").unwrap();
    session.finish().unwrap();

    let dataset =
        Dataset::open(fixture.dataset_path("d"), StoreMode::ReadOnly, fixture.repo()).unwrap();
    assert_eq!(dataset.mouse_ids(), vec!["205"]);
    assert_eq!(dataset.activity_log().len(), 2);
}
