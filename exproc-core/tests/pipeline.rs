use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use exproc_core::{
    ChartKind, ChartRenderer, DualAxisChart, ExperimentLayout, ExtractOutcome, MergeOutcome,
    merge_experiment, run_experiment,
};

#[derive(Default)]
struct RecordingRenderer {
    rendered: RefCell<Vec<(ChartKind, PathBuf, usize)>>,
}

impl ChartRenderer for RecordingRenderer {
    fn render(&self, chart: &DualAxisChart, dest: &Path) -> exproc_core::Result<()> {
        fs::write(dest, b"png")?;
        self.rendered
            .borrow_mut()
            .push((chart.kind, dest.to_path_buf(), chart.primary.points.len()));
        Ok(())
    }
}

const LOADGEN_HEADER: &str =
    "Timestamp (s),CPU (%),MEM (KB),Bandwidth (KB/s),Bandwidth Utilization (%),Open Sockets,VUS,RPS";

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn seed_results(layout: &ExperimentLayout) {
    let mut loadgen = format!("{LOADGEN_HEADER}\n");
    for ts in [100, 101, 102, 103, 110] {
        loadgen.push_str(&format!("{ts},5.5,2048,12.0,0.1,100,100,{}\n", ts - 1));
    }
    write(&layout.loadgen_results(), &loadgen);

    let mut server = String::from("TIMESTAMP,CPU,MEM\n");
    for ts in [100, 101, 102, 102, 103, 104, 105] {
        server.push_str(&format!("{ts},{}.5,4096\n", ts - 100));
    }
    write(&layout.server_results(), &server);
}

fn seed_log(layout: &ExperimentLayout) {
    let lines = [
        r#"time="2024-05-01T10:00:00Z" level=info msg="100,http://app/,GET,200,10,13" source=console"#,
        "running (0m00.5s), 100/200 VUs, 50 complete and 0 interrupted iterations",
        r#"time="2024-05-01T10:00:00Z" level=info msg="100,http://app/,GET,200,20,13" source=console"#,
        r#"time="2024-05-01T10:00:01Z" level=info msg="101,http://app/,GET,200,5,13" source=console"#,
        r#"time="2024-05-01T10:00:09Z" level=info msg="109,http://app/,GET,200,8,13" source=console"#,
    ];
    write(&layout.loadgen_log(), &lines.join("\n"));
}

#[test]
fn full_run_writes_all_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ExperimentLayout::new(dir.path());
    seed_results(&layout);
    seed_log(&layout);
    let renderer = RecordingRenderer::default();

    let report = run_experiment(&layout, &renderer).unwrap();

    assert_eq!(
        report.extract,
        ExtractOutcome::Written {
            dest: layout.per_request_results(),
            records: 4
        }
    );

    let MergeOutcome::Completed(merge) = report.merge else {
        panic!("merge did not complete");
    };
    assert_eq!(merge.alignment.horizon, 105);
    assert_eq!(merge.alignment.server_duplicates, 1);
    assert_eq!(merge.merged_rows, 4);

    let merged = fs::read_to_string(layout.merged_results()).unwrap();
    assert_eq!(
        merged,
        "timestamp,cpu_server,mem_server,cpu_loadgen,mem_loadgen,bandwidth_loadgen,\
         bandwidth_utilization_loadgen,open_sockets_loadgen,vus_loadgen,rps_loadgen\n\
         100,0.5,4096,5.5,2048,12,0.1,100,100,99\n\
         101,1.5,4096,5.5,2048,12,0.1,100,100,100\n\
         102,2.5,4096,5.5,2048,12,0.1,100,100,101\n\
         103,3.5,4096,5.5,2048,12,0.1,100,100,102\n"
    );

    let aggregated = merge.aggregated.expect("per-request table present");
    assert_eq!(aggregated.groups, 3);
    assert_eq!(aggregated.rows, 2);
    let agg = fs::read_to_string(layout.per_request_agg()).unwrap();
    let mut lines = agg.lines();
    assert_eq!(
        lines.next().unwrap(),
        "timestamp,response_time_mean,response_time_std,response_time_min,response_time_max,\
         cpu_server,mem_server,cpu_loadgen,mem_loadgen,bandwidth_loadgen,\
         bandwidth_utilization_loadgen,open_sockets_loadgen,vus_loadgen,rps_loadgen"
    );
    let t100: Vec<&str> = lines.next().unwrap().split(',').collect();
    assert_eq!(t100[0], "100");
    assert_eq!(t100[1], "15");
    assert!((t100[2].parse::<f64>().unwrap() - 50f64.sqrt()).abs() < 1e-9);
    assert_eq!(&t100[3..6], ["10", "20", "0.5"]);
    assert_eq!(lines.next().unwrap(), "101,5,,5,5,1.5,4096,5.5,2048,12,0.1,100,100,100");
    assert_eq!(lines.next(), None);

    let rendered = renderer.rendered.borrow();
    let kinds: Vec<ChartKind> = rendered.iter().map(|(k, _, _)| *k).collect();
    assert_eq!(
        kinds,
        [
            ChartKind::RpsVsCpu,
            ChartKind::RpsVsMem,
            ChartKind::ResponseTimeVsCpu,
            ChartKind::ResponseTimeVsMem
        ]
    );
    assert_eq!(rendered[0].2, 4);
    assert_eq!(rendered[2].2, 2);
    for kind in kinds {
        assert!(layout.plot(kind).exists());
    }
    assert_eq!(merge.charts.len(), 4);
}

#[test]
fn merge_without_per_request_table_renders_two_charts() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ExperimentLayout::new(dir.path());
    seed_results(&layout);
    let renderer = RecordingRenderer::default();

    let outcome = merge_experiment(&layout, &renderer).unwrap();

    let MergeOutcome::Completed(merge) = outcome else {
        panic!("merge did not complete");
    };
    assert!(merge.aggregated.is_none());
    assert!(!layout.per_request_agg().exists());
    assert_eq!(renderer.rendered.borrow().len(), 2);
}

#[test]
fn disjoint_collectors_write_header_only() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ExperimentLayout::new(dir.path());
    write(
        &layout.loadgen_results(),
        &format!("{LOADGEN_HEADER}\n200,1,1,1,1,1,1,1\n201,1,1,1,1,1,1,1\n"),
    );
    write(&layout.server_results(), "TIMESTAMP,CPU,MEM\n100,1,1\n101,1,1\n");
    let renderer = RecordingRenderer::default();

    let outcome = merge_experiment(&layout, &renderer).unwrap();

    let MergeOutcome::Completed(merge) = outcome else {
        panic!("merge did not complete");
    };
    assert_eq!(merge.alignment.horizon, 101);
    assert_eq!(merge.alignment.loadgen_rows, 0);
    assert_eq!(merge.merged_rows, 0);
    let merged = fs::read_to_string(layout.merged_results()).unwrap();
    assert_eq!(merged.lines().count(), 1);
    assert!(merged.starts_with("timestamp,cpu_server,mem_server,"));
    assert_eq!(renderer.rendered.borrow()[0].2, 0);
}

#[test]
fn missing_server_results_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ExperimentLayout::new(dir.path());
    seed_results(&layout);
    seed_log(&layout);
    fs::remove_file(layout.server_results()).unwrap();
    let renderer = RecordingRenderer::default();

    let outcome = merge_experiment(&layout, &renderer).unwrap();

    match outcome {
        MergeOutcome::MissingInputs { missing } => {
            assert_eq!(missing, vec![layout.server_results()])
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(!layout.merged_results().exists());
    assert!(!layout.data_dir().exists());
    assert!(!layout.plots_dir().exists());
    assert!(renderer.rendered.borrow().is_empty());
}

#[test]
fn missing_both_results_and_log() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ExperimentLayout::new(dir.path());
    let renderer = RecordingRenderer::default();

    let report = run_experiment(&layout, &renderer).unwrap();

    assert!(matches!(report.extract, ExtractOutcome::SourceMissing { .. }));
    assert!(matches!(
        report.merge,
        MergeOutcome::MissingInputs { ref missing } if missing.len() == 2
    ));
    assert!(!layout.per_request_results().exists());
}

#[test]
fn malformed_log_line_aborts_before_merge() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ExperimentLayout::new(dir.path());
    seed_results(&layout);
    write(&layout.loadgen_log(), "msg=\"100,http://app/,GET\"\n");
    let renderer = RecordingRenderer::default();

    let err = run_experiment(&layout, &renderer).unwrap_err();

    assert!(matches!(err, exproc_core::Error::FieldCount { line: 1, found: 3, .. }));
    assert!(!layout.merged_results().exists());
}
