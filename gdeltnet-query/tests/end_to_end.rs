// Copyright 2025 The gdeltnet Authors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! End-to-end: events -> day/month artifacts -> year analysis -> exports.

use gdeltnet_core::{
    AnalysisConfig, CommunityAlgorithmKind, CountryIndex, DayKey, Event, GdeltNetError, MonthKey,
    Polarity,
};
use gdeltnet_graph::WeightedGraph;
use gdeltnet_query::{
    write_csv, CommunityRow, CommunityRun, MetricRow, MonthPipeline, YearAnalysis,
};
use gdeltnet_storage::{ArtifactRegistry, InMemoryEventSource};
use std::fs::File;
use std::sync::Arc;
use tempfile::TempDir;

const EPS: f64 = 1e-9;

fn day(s: &str) -> DayKey {
    DayKey::parse(s).unwrap()
}

fn month(year: i32, m: u32) -> MonthKey {
    MonthKey::new(year, m).unwrap()
}

/// USA/RUS/CHN with one cooperative and one conflictual event in January,
/// and a cooperative RUS-CHN event in February.
fn three_country_run() -> Arc<ArtifactRegistry> {
    let countries = Arc::new(CountryIndex::from_codes(["USA", "RUS", "CHN"]).unwrap());
    let registry = Arc::new(ArtifactRegistry::new(countries));

    let mut source = InMemoryEventSource::new();
    source.push_day(
        day("20230115"),
        vec![
            Event::new("USA", "RUS", 5.0, 2.0, 3.0, 1.0),
            Event::new("USA", "CHN", -2.0, 1.0, 1.0, 0.5),
        ],
    );
    source.push_day(
        day("20230210"),
        vec![Event::new("RUS", "CHN", 1.0, 0.0, 0.0, 0.0)],
    );

    let pipeline = MonthPipeline::new(
        Arc::new(source),
        Arc::clone(&registry),
        &AnalysisConfig::default(),
    );
    let reports = pipeline.build_year(2023).unwrap();
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.month_written && r.failed_days.is_empty()));
    registry
}

#[test]
fn test_three_country_day_matrix() {
    let registry = three_country_run();
    let m = registry.day(day("20230115")).unwrap();

    assert!((m[[0, 1]] - 5.09).abs() < EPS);
    assert!((m[[0, 2]] + 2.03).abs() < EPS);
    assert_eq!(m[[1, 2]], 0.0);
    for i in 0..3 {
        assert_eq!(m[[i, i]], 0.0);
        for j in 0..3 {
            assert_eq!(m[[i, j]], m[[j, i]]);
        }
    }

    // A single day: the month average is the day itself.
    let jan = registry.month(month(2023, 1)).unwrap();
    assert_eq!(*jan, *m);
}

#[test]
fn test_year_analysis_from_pipeline() {
    let registry = three_country_run();
    let mut analysis = YearAnalysis::prepare(&registry, 2023, &AnalysisConfig::default()).unwrap();

    assert_eq!(analysis.months(), vec![month(2023, 1), month(2023, 2)]);
    assert!((analysis.normalized().pos_factor - 5.09).abs() < EPS);
    assert!((analysis.normalized().neg_factor - 2.03).abs() < EPS);

    let jan_a = analysis.edges(month(2023, 1), Polarity::Alliance).unwrap();
    assert_eq!(jan_a.len(), 1);
    assert!((jan_a[0].weight - 1.0).abs() < EPS);
    let jan_h = analysis.edges(month(2023, 1), Polarity::Hostility).unwrap();
    assert_eq!((jan_h[0].source, jan_h[0].target), (0, 2));
    assert!((jan_h[0].weight - 1.0).abs() < EPS);
    let feb_a = analysis.edges(month(2023, 2), Polarity::Alliance).unwrap();
    assert_eq!((feb_a[0].source, feb_a[0].target), (1, 2));
    assert!((feb_a[0].weight - 1.0 / 5.09).abs() < EPS);

    // Alliance and hostility never share an edge.
    for m in analysis.months() {
        let a = analysis.graph(m, Polarity::Alliance).unwrap();
        let h = analysis.graph(m, Polarity::Hostility).unwrap();
        for edge in a.edges() {
            assert!(!h.has_edge(edge.source, edge.target));
        }
    }

    assert!(matches!(
        analysis.metrics_document(),
        Err(GdeltNetError::MetricsNotInitialized { year: 2023 })
    ));
    analysis.estimate_metrics();

    let document = serde_json::to_value(analysis.metrics_document().unwrap()).unwrap();
    let jan_hostility = &document["1"]["H"];
    assert!((jan_hostility["sparsity_ratio"].as_f64().unwrap() - 4.0 / 6.0).abs() < EPS);
    assert_eq!(jan_hostility["global_metrics"]["trans"], 0.0);
    assert!(document["2"]["A"]["nodal_metrics"]["BC"]["0"].is_number());

    let rows = analysis.metric_rows().unwrap();
    assert_eq!(rows.len(), 2 * 2 * 14);
    assert!(rows.iter().all(|r| r.year == 2023));
    assert_eq!(rows[0].month, 1);
}

#[test]
fn test_snapshot_preserves_analysis_input() {
    let registry = three_country_run();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("registry.bin");
    registry.save_snapshot(&path).unwrap();

    let restored = ArtifactRegistry::load_snapshot(&path).unwrap();
    assert_eq!(restored.years(), vec![2023]);
    assert_eq!(restored.countries().code(2), Some("CHN"));

    let config = AnalysisConfig::default();
    let before = YearAnalysis::prepare(&registry, 2023, &config).unwrap();
    let after = YearAnalysis::prepare(&restored, 2023, &config).unwrap();
    for m in before.months() {
        for polarity in Polarity::ALL {
            assert_eq!(before.edges(m, polarity).unwrap(), after.edges(m, polarity).unwrap());
        }
    }
}

#[test]
fn test_year_without_hostility_is_degenerate() {
    let countries = Arc::new(CountryIndex::from_codes(["USA", "RUS", "CHN"]).unwrap());
    let registry = Arc::new(ArtifactRegistry::new(countries));
    let mut source = InMemoryEventSource::new();
    source.push_day(
        day("20190301"),
        vec![Event::new("USA", "RUS", 3.0, 0.0, 0.0, 0.0)],
    );
    MonthPipeline::new(Arc::new(source), Arc::clone(&registry), &AnalysisConfig::default())
        .build_month(month(2019, 3))
        .unwrap();

    assert!(matches!(
        YearAnalysis::prepare(&registry, 2019, &AnalysisConfig::default()),
        Err(GdeltNetError::DegenerateNormalization {
            year: 2019,
            missing: Polarity::Hostility
        })
    ));
}

/// Two five-country blocs, each a star around its hub, plus one hostile
/// event across the blocs.
fn bloc_registry() -> Arc<ArtifactRegistry> {
    let countries = Arc::new(
        CountryIndex::from_codes([
            "USA", "GBR", "FRA", "DEU", "ITA", "RUS", "CHN", "IRN", "PRK", "SYR",
        ])
        .unwrap(),
    );
    let registry = Arc::new(ArtifactRegistry::new(countries));

    let mut events = Vec::new();
    for leaf in ["USA", "GBR", "FRA", "ITA"] {
        events.push(Event::new("DEU", leaf, 5.0, 0.0, 0.0, 0.0));
    }
    for leaf in ["CHN", "IRN", "PRK", "SYR"] {
        events.push(Event::new(leaf, "RUS", 4.0, 0.0, 0.0, 0.0));
    }
    events.push(Event::new("USA", "RUS", -6.0, 0.0, 0.0, 0.0));

    let mut source = InMemoryEventSource::new();
    source.push_day(day("20200312"), events);
    MonthPipeline::new(Arc::new(source), Arc::clone(&registry), &AnalysisConfig::default())
        .build_month(month(2020, 3))
        .unwrap();
    registry
}

#[test]
fn test_bloc_representatives() {
    let registry = bloc_registry();
    for algorithm in [CommunityAlgorithmKind::Louvain, CommunityAlgorithmKind::Walktrap] {
        let config = AnalysisConfig {
            community_algorithm: algorithm,
            ..AnalysisConfig::default()
        };
        let run = CommunityRun::execute(&registry, &config, None).unwrap();
        assert_eq!(
            run.representatives(None).unwrap(),
            vec!["DEU".to_string(), "RUS".to_string()],
            "{:?}",
            algorithm
        );

        let rows = run.rows(Some(&[2020])).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].month, "03");
        assert_eq!(rows[0].node_id, 3);
        assert_eq!(rows[0].metric, "BC");
        // Hub of a four-leaf star in a ten-node graph: 12 / (9 * 8).
        assert!((rows[0].value - 1.0 / 6.0).abs() < EPS);
        assert_eq!(rows[1].node_id, 5);

        let communities = run
            .analysis(2020)
            .unwrap()
            .communities(month(2020, 3))
            .unwrap();
        assert!(communities.iter().all(|c| c.size >= config.min_community_size));
        assert!(communities
            .iter()
            .all(|c| c.members.contains(&c.representative_index)));
    }
}

fn same_value(a: f64, b: f64) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}

#[test]
fn test_csv_exports_round_trip() {
    let dir = TempDir::new().unwrap();

    let registry = three_country_run();
    let mut analysis = YearAnalysis::prepare(&registry, 2023, &AnalysisConfig::default()).unwrap();
    analysis.estimate_metrics();
    let metric_rows = analysis.metric_rows().unwrap();

    let metrics_path = dir.path().join("metric_rows_2023.csv");
    write_csv(File::create(&metrics_path).unwrap(), &metric_rows).unwrap();
    let read_back: Vec<MetricRow> = csv::Reader::from_path(&metrics_path)
        .unwrap()
        .deserialize()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(read_back.len(), metric_rows.len());
    for (written, read) in metric_rows.iter().zip(&read_back) {
        assert_eq!(
            (written.year, written.month, written.graph_type, written.metric_type),
            (read.year, read.month, read.graph_type, read.metric_type)
        );
        assert_eq!((&written.metric_name, &written.node), (&read.metric_name, &read.node));
        assert!(same_value(written.value, read.value), "{:?} vs {:?}", written, read);
    }

    let run = CommunityRun::execute(&bloc_registry(), &AnalysisConfig::default(), None).unwrap();
    let community_rows = run.rows(None).unwrap();
    let communities_path = dir.path().join("communities.csv");
    write_csv(File::create(&communities_path).unwrap(), &community_rows).unwrap();

    let text = std::fs::read_to_string(&communities_path).unwrap();
    assert!(text.starts_with("year,month,node_id,node_name,metric,value\n"));
    let read_back: Vec<CommunityRow> = csv::Reader::from_path(&communities_path)
        .unwrap()
        .deserialize()
        .collect::<Result<_, _>>()
        .unwrap();
    // Two-digit months survive as text.
    assert_eq!(read_back[0].month, "03");
    assert_eq!(read_back, community_rows);
}
