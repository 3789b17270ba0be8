mod support;

use bikecat::config::{CatalogPaths, QueryConfig};
use bikecat::loader::{LoadPlan, initialize};
use bikecat::query::{QueryService, SqlPolicy};
use bikecat::render::NO_RESULTS;
use support::{LISTINGS, catalog_paths, data_lines, table_cells, write_catalog_workbook};
use tempfile::TempDir;

fn loaded_catalog() -> (TempDir, CatalogPaths) {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let paths = catalog_paths(dir.path());
    write_catalog_workbook(&paths.workbook_path, LISTINGS);
    let outcome = initialize(&LoadPlan::from_paths(&paths));
    assert!(outcome.is_success(), "fixture load failed: {outcome}");
    (dir, paths)
}

fn read_only_service(paths: &CatalogPaths) -> QueryService {
    QueryService::with_config(
        &paths.store_path,
        QueryConfig {
            policy: SqlPolicy::ReadOnly,
            ..QueryConfig::default()
        },
    )
}

#[test]
fn count_renders_as_single_cell_table() {
    let (_dir, paths) = loaded_catalog();
    let service = QueryService::new(&paths.store_path);

    let output = service.run("SELECT COUNT(*) FROM catalog");
    assert_eq!(
        output,
        "|   COUNT(*) |\n|-----------:|\n|          5 |"
    );
}

#[test]
fn filtered_projection_matches_snapshot() {
    let (_dir, paths) = loaded_catalog();
    let service = QueryService::new(&paths.store_path);

    let output =
        service.run("SELECT id, brand, model FROM catalog WHERE brand = 'Honda' ORDER BY id");
    insta::assert_snapshot!(output, @r"
    |   id | brand   | model     |
    |-----:|:--------|:----------|
    |    3 | Honda   | Vario 125 |
    |    4 | Honda   | Beat      |
    ");
}

#[test]
fn empty_results_return_the_sentinel() {
    let (_dir, paths) = loaded_catalog();
    let service = QueryService::new(&paths.store_path);

    assert_eq!(service.run("SELECT * FROM catalog WHERE 1 = 0"), NO_RESULTS);
    assert_eq!(
        service.run("SELECT model FROM catalog WHERE brand = 'Ducati'"),
        NO_RESULTS
    );
}

#[test]
fn malformed_sql_is_returned_as_error_text() {
    let (_dir, paths) = loaded_catalog();
    let service = QueryService::new(&paths.store_path);

    let output = service.run("SELEKT * FROM catalog");
    assert!(output.starts_with("SQL Error: "), "unexpected output: {output}");
    assert!(output.contains("syntax error"), "unexpected output: {output}");

    let unknown_column = service.run("SELECT horsepower FROM catalog");
    assert!(unknown_column.starts_with("SQL Error: "));
    assert!(unknown_column.contains("no such column"));
}

#[test]
fn ordering_is_preserved_in_rendered_rows() {
    let (_dir, paths) = loaded_catalog();
    let service = QueryService::new(&paths.store_path);

    let output = service.run("SELECT id, price FROM catalog ORDER BY id");
    let ids = data_lines(&output)
        .into_iter()
        .map(|line| table_cells(line)[0].clone())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);

    let descending = service.run("SELECT price FROM catalog ORDER BY price DESC LIMIT 2");
    let prices = data_lines(&descending)
        .into_iter()
        .map(|line| table_cells(line)[0].clone())
        .collect::<Vec<_>>();
    assert_eq!(prices, vec!["38000000", "21000000"]);
}

#[test]
fn unrestricted_policy_applies_mutations() {
    let (_dir, paths) = loaded_catalog();
    let service = QueryService::new(&paths.store_path);

    assert_eq!(
        service.run("UPDATE catalog SET is_sold = 1 WHERE id = 3"),
        NO_RESULTS
    );
    let sold = service.run("SELECT COUNT(*) AS sold FROM catalog WHERE is_sold = 1");
    assert_eq!(table_cells(data_lines(&sold)[0]), vec!["3"]);
}

#[test]
fn read_only_policy_answers_queries_but_rejects_mutations() {
    let (_dir, paths) = loaded_catalog();
    let service = read_only_service(&paths);

    let brands = service.run("SELECT DISTINCT brand FROM catalog ORDER BY brand");
    let names = data_lines(&brands)
        .into_iter()
        .map(|line| table_cells(line)[0].clone())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["Honda", "Kawasaki", "Suzuki", "Yamaha"]);

    let rejected = service.run("DELETE FROM catalog");
    assert!(
        rejected.starts_with("SQL Error: Mutating SQL keyword `delete`"),
        "unexpected output: {rejected}"
    );

    let remaining = QueryService::new(&paths.store_path).run("SELECT COUNT(*) FROM catalog");
    assert_eq!(table_cells(data_lines(&remaining)[0]), vec!["5"]);
}

#[test]
fn try_run_exposes_typed_rows() {
    let (_dir, paths) = loaded_catalog();
    let service = QueryService::new(&paths.store_path);

    let table = service
        .try_run("SELECT model, year FROM catalog WHERE id = 2")
        .expect("query should succeed");
    assert_eq!(table.columns, vec!["model", "year"]);
    assert_eq!(
        table.json_rows(),
        vec![serde_json::json!({ "model": "Ninja 250", "year": 2018 })]
    );
}
