#![allow(dead_code)]

use std::{fs, path::Path};

use energy_service::config::AppConfig;

pub const HEADER: &str = "Date;Time;TOUR_A_(TGBT_D14) kW sys avg;Tour_B_(TGBT_D5) kW sys avg";

/// Monday 2025-03-03, one hour of readings plus a `24:00:00` sentinel row.
pub const MARCH_ROWS: &[&str] = &[
    "03/03/2025;00:00:00;1;2",
    "03/03/2025;00:15:00;2;2",
    "03/03/2025;00:30:00;;2",
    "03/03/2025;00:45:00;3;2",
    "03/03/2025;24:00:00;9;9",
];

pub fn write_csv(path: &Path, rows: &[&str]) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let mut body = String::from(HEADER);
    for row in rows {
        body.push('\n');
        body.push_str(row);
    }
    body.push('\n');
    fs::write(path, body).unwrap();
}

/// Data tree with one good March export and one file without a Date column.
pub fn seed_data_dir(root: &Path) {
    write_csv(&root.join("2025-03").join("export_01.csv"), MARCH_ROWS);
    fs::write(root.join("notes.csv"), "foo;bar\n1;2\n").unwrap();
}

pub fn config_for(root: &Path) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.data.root_dir = root.to_path_buf();
    cfg
}
