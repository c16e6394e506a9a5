mod common;

use common::sample_record;
use ctet_result_scraper::export::{build_table, ExportTable, PassMarker};
use ctet_result_scraper::models::{Record, SubjectMark};
use ctet_result_scraper::storage::{load_records, save_records};

fn column_index(table: &ExportTable, header: &str) -> usize {
    table
        .headers
        .iter()
        .position(|h| h == header)
        .unwrap_or_else(|| panic!("表头中应该有 {} 列", header))
}

#[test]
fn headers_are_fixed_columns_plus_sorted_subject_union() {
    let records = vec![
        sample_record("2", vec![SubjectMark::new("LANGUAGE - I", "24 out of 30")]),
        sample_record(
            "1",
            vec![SubjectMark::new(
                "CHILD DEVELOPMENT & PEDAGOGY",
                "23 out of 30",
            )],
        ),
    ];

    let table = build_table(&records);

    let expected: Vec<String> = [
        "Roll No",
        "Name",
        "Mother's Name",
        "Father's/Husband's Name",
        "Category",
        "Paper Type",
        "Timestamp",
        "CHILD DEVELOPMENT & PEDAGOGY Marks Obtained",
        "CHILD DEVELOPMENT & PEDAGOGY Total Marks",
        "LANGUAGE - I Marks Obtained",
        "LANGUAGE - I Total Marks",
        "Total Percentage",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect();
    assert_eq!(table.headers, expected);
}

#[test]
fn build_table_is_idempotent() {
    let records = vec![
        sample_record("3", vec![SubjectMark::new("B SUBJECT", "10 out of 20")]),
        sample_record("1", vec![SubjectMark::new("A SUBJECT", "15 out of 20")]),
        sample_record("2", vec![SubjectMark::new("C SUBJECT", "5 out of 20")]),
    ];

    let first = build_table(&records);
    let second = build_table(&records);

    assert_eq!(first, second, "同一份输入两次构建应该完全一致");
}

#[test]
fn rows_sort_by_numeric_roll_with_parse_failures_first() {
    let records = vec![
        sample_record("20", vec![SubjectMark::new("CDP", "23 out of 30")]),
        sample_record("abc", vec![SubjectMark::new("CDP", "20 out of 30")]),
        sample_record("3", vec![SubjectMark::new("CDP", "25 out of 30")]),
    ];

    let table = build_table(&records);

    let rolls: Vec<&str> = table.rows.iter().map(|r| r.cells[0].as_str()).collect();
    // 解析失败按 0 处理，排在最前
    assert_eq!(rolls, vec!["abc", "3", "20"]);
}

#[test]
fn composite_subject_is_split_when_exporting_external_json() {
    // 外部来源的JSON里复合科目还没拆开
    let records = vec![sample_record(
        "1",
        vec![SubjectMark::new(
            "Mathematics & Science",
            "45 out of 60 (Mathematics - 24 Science - 21)",
        )],
    )];

    let table = build_table(&records);

    assert!(
        !table.headers.iter().any(|h| h.contains("Mathematics & Science")),
        "复合科目本身不应该出现在表头里"
    );

    let row = &table.rows[0];
    assert_eq!(row.cells[column_index(&table, "Mathematics Marks Obtained")], "24");
    assert_eq!(row.cells[column_index(&table, "Mathematics Total Marks")], "30");
    assert_eq!(row.cells[column_index(&table, "Science Marks Obtained")], "21");
    assert_eq!(row.cells[column_index(&table, "Science Total Marks")], "30");
}

#[test]
fn missing_subjects_leave_blank_cells() {
    let records = vec![
        sample_record("1", vec![SubjectMark::new("CDP", "23 out of 30")]),
        sample_record("2", vec![SubjectMark::new("LANGUAGE - I", "24 out of 30")]),
    ];

    let table = build_table(&records);
    let cdp_col = column_index(&table, "CDP Marks Obtained");

    assert_eq!(table.rows[0].cells[cdp_col], "23");
    // 缺考科目留空，不是零分
    assert_eq!(table.rows[1].cells[cdp_col], "");
}

#[test]
fn percentage_formats_to_two_decimals() {
    let records = vec![sample_record(
        "1",
        vec![SubjectMark::new("PAPER", "59 out of 100")],
    )];

    let table = build_table(&records);
    let pct_col = column_index(&table, "Total Percentage");

    assert_eq!(table.rows[0].cells[pct_col], "59.00%");
    assert_eq!(table.rows[0].marker, Some(PassMarker::Fail));
}

#[test]
fn pass_marker_boundary_is_inclusive_at_sixty() {
    let records = vec![
        sample_record("1", vec![SubjectMark::new("PAPER", "60 out of 100")]),
        sample_record("2", vec![SubjectMark::new("PAPER", "59.99 out of 100")]),
    ];

    let table = build_table(&records);
    let pct_col = column_index(&table, "Total Percentage");

    assert_eq!(table.rows[0].cells[pct_col], "60.00%");
    assert_eq!(table.rows[0].marker, Some(PassMarker::Pass), "60.00 应该算通过");
    assert_eq!(table.rows[1].marker, Some(PassMarker::Fail), "59.99 应该算未通过");
}

#[test]
fn zero_total_yields_na_and_no_marker() {
    let records = vec![sample_record(
        "1",
        vec![SubjectMark::new("PAPER", "0 out of 0")],
    )];

    let table = build_table(&records);
    let pct_col = column_index(&table, "Total Percentage");

    assert_eq!(table.rows[0].cells[pct_col], "N/A");
    assert_eq!(table.rows[0].marker, None, "N/A 行不应该有着色标记");
}

#[test]
fn total_row_is_excluded_from_percentage() {
    let records = vec![sample_record(
        "1",
        vec![
            SubjectMark::new("CDP", "24 out of 30"),
            // TOTAL 行不参与百分比计算
            SubjectMark::new("TOTAL", "999 out of 999"),
        ],
    )];

    let table = build_table(&records);
    let pct_col = column_index(&table, "Total Percentage");

    assert_eq!(table.rows[0].cells[pct_col], "80.00%");
}

#[test]
fn record_json_uses_wire_field_names() {
    let record = sample_record("1", vec![SubjectMark::new("CDP", "23 out of 30")]);

    let json = serde_json::to_value(&record).expect("序列化应该成功");

    assert!(json.get("personal_info").is_some());
    assert!(json.get("timestamp").is_some());
    let marks_info = json.get("marks_info").expect("应该有 marks_info 字段");
    assert!(marks_info.get("paper_type").is_some());
    let subjects = marks_info
        .get("subjects")
        .and_then(|s| s.as_array())
        .expect("subjects 应该是数组");
    assert!(subjects[0].get("subject").is_some());
    assert!(subjects[0].get("marks").is_some());
}

#[test]
fn records_round_trip_through_json_file() {
    let records = vec![
        sample_record("1", vec![SubjectMark::new("CDP", "23 out of 30")]),
        sample_record(
            "2",
            vec![
                SubjectMark::new("Mathematics", "24 out of 30"),
                SubjectMark::new("Science", "21 out of 30"),
            ],
        ),
    ];

    let path = std::env::temp_dir().join(format!(
        "ctet_results_roundtrip_{}.json",
        std::process::id()
    ));
    save_records(&path, &records).expect("落盘应该成功");
    let loaded: Vec<Record> = load_records(&path).expect("读回应该成功");
    let _ = std::fs::remove_file(&path);

    assert_eq!(loaded, records, "JSON往返不应该丢失任何字段");
}
