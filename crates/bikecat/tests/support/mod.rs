#![allow(dead_code)]

use std::path::Path;

use bikecat::config::CatalogPaths;
use rust_xlsxwriter::Workbook;

pub const HEADER: [&str; 6] = ["id", "brand", "model", "year", "price", "is_sold"];

#[derive(Debug, Clone, Copy)]
pub struct Listing {
    pub id: i64,
    pub brand: &'static str,
    pub model: &'static str,
    pub year: i64,
    pub price: f64,
    pub is_sold: bool,
}

/// Written in non-sorted id order on purpose.
pub const LISTINGS: &[Listing] = &[
    Listing {
        id: 3,
        brand: "Honda",
        model: "Vario 125",
        year: 2021,
        price: 17_500_000.0,
        is_sold: false,
    },
    Listing {
        id: 1,
        brand: "Yamaha",
        model: "NMAX",
        year: 2019,
        price: 21_000_000.0,
        is_sold: true,
    },
    Listing {
        id: 5,
        brand: "Suzuki",
        model: "GSX-R150",
        year: 2020,
        price: 19_250_000.0,
        is_sold: false,
    },
    Listing {
        id: 2,
        brand: "Kawasaki",
        model: "Ninja 250",
        year: 2018,
        price: 38_000_000.0,
        is_sold: false,
    },
    Listing {
        id: 4,
        brand: "Honda",
        model: "Beat",
        year: 2022,
        price: 13_750_000.0,
        is_sold: true,
    },
];

pub fn catalog_paths(dir: &Path) -> CatalogPaths {
    CatalogPaths::in_dir(dir)
}

pub fn write_catalog_workbook(path: &Path, listings: &[Listing]) {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Listings").expect("sheet name should be valid");

    for (col, name) in HEADER.iter().enumerate() {
        worksheet
            .write_string(0, col as u16, *name)
            .expect("header cell should write");
    }
    for (index, listing) in listings.iter().enumerate() {
        let row = index as u32 + 1;
        worksheet
            .write_number(row, 0, listing.id as f64)
            .expect("id should write");
        worksheet
            .write_string(row, 1, listing.brand)
            .expect("brand should write");
        worksheet
            .write_string(row, 2, listing.model)
            .expect("model should write");
        worksheet
            .write_number(row, 3, listing.year as f64)
            .expect("year should write");
        worksheet
            .write_number(row, 4, listing.price)
            .expect("price should write");
        worksheet
            .write_boolean(row, 5, listing.is_sold)
            .expect("is_sold should write");
    }

    workbook.save(path).expect("workbook should save");
}

/// Splits a markdown table line into trimmed cell texts.
pub fn table_cells(line: &str) -> Vec<String> {
    let inner = line
        .trim()
        .strip_prefix('|')
        .and_then(|rest| rest.strip_suffix('|'))
        .unwrap_or(line);
    inner
        .split(" | ")
        .map(|cell| cell.trim().to_string())
        .collect()
}

/// Data lines of a rendered table (header and alignment rows skipped).
pub fn data_lines(rendered: &str) -> Vec<&str> {
    rendered.lines().skip(2).collect()
}
