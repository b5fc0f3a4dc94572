//! SQL schema for the KPI SQLite store.
//!
//! The reports only ever read the two views. The backing tables exist so an
//! empty database file is usable and so imports have somewhere to land; a
//! database that already defines the views keeps its own definitions.

/// Names of the reporting views.
pub const KPI_VIEW: &str = "vw_Employee_KPI_All";
pub const TURNOVER_VIEW: &str = "vw_Employee_Turnover_ByJobTitle";

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS employee_kpi_monthly (
    store_id             TEXT    NOT NULL,
    year                 INTEGER NOT NULL,
    month_number         INTEGER NOT NULL CHECK (month_number BETWEEN 1 AND 12),
    total_sales          REAL,
    avg_headcount        REAL,
    sales_per_employee   REAL,
    headcount_growth_pct REAL,
    turnover             REAL,
    PRIMARY KEY (store_id, year, month_number)
);

CREATE TABLE IF NOT EXISTS employee_turnover_monthly (
    store_id        TEXT    NOT NULL,
    year            INTEGER NOT NULL,
    month_number    INTEGER NOT NULL CHECK (month_number BETWEEN 1 AND 12),
    job_title       TEXT    NOT NULL DEFAULT 'Unknown',
    gender          TEXT    NOT NULL DEFAULT 'Unknown',
    start_headcount REAL,
    end_headcount   REAL,
    terminations    REAL,
    turnover_pct    REAL,
    PRIMARY KEY (store_id, year, month_number, job_title, gender)
);

CREATE VIEW IF NOT EXISTS vw_Employee_KPI_All AS
SELECT store_id             AS StoreID,
       year                 AS Year,
       month_number         AS MonthNumber,
       total_sales          AS TotalSales,
       avg_headcount        AS AvgHeadcount,
       sales_per_employee   AS SalesPerEmployee,
       headcount_growth_pct AS HeadcountGrowthPct,
       turnover             AS Turnover
FROM employee_kpi_monthly;

CREATE VIEW IF NOT EXISTS vw_Employee_Turnover_ByJobTitle AS
SELECT store_id        AS StoreID,
       year            AS Year,
       month_number    AS MonthNumber,
       job_title       AS JobTitle,
       gender          AS Gender,
       start_headcount AS Start_Headcount,
       end_headcount   AS End_Headcount,
       terminations    AS Terminations,
       turnover_pct    AS TurnoverPct
FROM employee_turnover_monthly;
";
