use crate::util::{format_lempiras, format_number, format_percent};
use serde::{Deserialize, Serialize};
use std::fmt;
use tabled::Tabled;

/// Member category. `J` marks a juridical person (an organization), so this
/// is not a binary gender field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Genero {
    #[serde(rename = "H")]
    Male,
    #[serde(rename = "M")]
    Female,
    #[serde(rename = "J")]
    Juridical,
    #[default]
    #[serde(rename = "?")]
    Unknown,
}

impl Genero {
    pub fn from_code(code: Option<&str>) -> Self {
        match code.map(str::trim) {
            Some("H") => Genero::Male,
            Some("M") => Genero::Female,
            Some("J") => Genero::Juridical,
            _ => Genero::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Genero::Male => "Hombres",
            Genero::Female => "Mujeres",
            Genero::Juridical => "Personas Jurídicas",
            Genero::Unknown => "Sin clasificar",
        }
    }
}

impl fmt::Display for Genero {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OrganType {
    JuntaDirectiva,
    JuntaVigilancia,
    #[default]
    Other,
}

impl OrganType {
    pub fn from_name(name: Option<&str>) -> Self {
        match name.map(str::trim) {
            Some("Junta Directiva") => OrganType::JuntaDirectiva,
            Some("Junta de Vigilancia") => OrganType::JuntaVigilancia,
            _ => OrganType::Other,
        }
    }
}

// ---------------------------------------------------------------------------
// Raw CSV rows. Every column is optional text; the loader cleans them.
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct RawCatalogRow {
    pub id: Option<String>,
    pub nombre: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawMunicipalityRow {
    pub id: Option<String>,
    pub nombre: Option<String>,
    pub departamento_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawCooperativeRow {
    pub estado: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawAffiliateRow {
    pub estado: Option<String>,
    pub genero: Option<String>,
    pub departamento_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawCreditRow {
    pub genero: Option<String>,
    pub saldo_actual: Option<String>,
    pub monto: Option<String>,
    pub tipo_credito_id: Option<String>,
    pub departamento_id: Option<String>,
    pub edad: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawDirectorRow {
    pub genero: Option<String>,
    pub tipo_organo: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawEmployeeRow {
    pub genero: Option<String>,
    pub estado: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawOfficerRow {
    pub genero: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawDepositRow {
    pub saldo: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RawRemittanceRow {
    pub monto_usd: Option<String>,
}

// ---------------------------------------------------------------------------
// Clean records held by the snapshot.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Department {
    pub id: i64,
    pub nombre: String,
}

#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub struct Municipality {
    pub id: i64,
    pub nombre: String,
    pub departamento_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Cooperative {
    pub estado: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreditType {
    pub id: i64,
    pub nombre: String,
}

#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub struct DepositType {
    pub id: i64,
    pub nombre: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Affiliate {
    pub estado: String,
    pub genero: Genero,
    pub departamento_id: Option<i64>,
}

/// Money fields are already defaulted to zero when the column was empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Credit {
    pub genero: Genero,
    pub saldo_actual: f64,
    pub monto: f64,
    pub tipo_credito_id: Option<i64>,
    pub departamento_id: Option<i64>,
    pub edad: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Director {
    pub genero: Genero,
    pub tipo_organo: OrganType,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Employee {
    pub genero: Genero,
    pub estado: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Officer {
    pub genero: Genero,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Deposit {
    pub saldo: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Remittance {
    pub monto_usd: f64,
}

// ---------------------------------------------------------------------------
// Aggregation results. Numeric fields keep their units; tables format them.
// ---------------------------------------------------------------------------

fn display_percent(value: &Option<f64>) -> String {
    format_percent(*value)
}

fn display_lempiras(value: &f64) -> String {
    format_lempiras(*value)
}

fn display_millions(value: &f64) -> String {
    format_number(*value, 2)
}

/// Counts per member category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Tabled)]
pub struct GenderCounts {
    #[tabled(rename = "Hombres")]
    pub hombres: usize,
    #[tabled(rename = "Mujeres")]
    pub mujeres: usize,
    #[tabled(rename = "Personas Jurídicas")]
    pub juridicas: usize,
}

impl GenderCounts {
    pub fn add(&mut self, genero: Genero) {
        match genero {
            Genero::Male => self.hombres += 1,
            Genero::Female => self.mujeres += 1,
            Genero::Juridical => self.juridicas += 1,
            Genero::Unknown => {}
        }
    }

    pub fn total(&self) -> usize {
        self.hombres + self.mujeres + self.juridicas
    }
}

/// Currency sums per member category, in base units (lempiras).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Tabled)]
pub struct GenderAmounts {
    #[tabled(rename = "Hombres", display_with = "display_lempiras")]
    pub hombres: f64,
    #[tabled(rename = "Mujeres", display_with = "display_lempiras")]
    pub mujeres: f64,
    #[tabled(rename = "Personas Jurídicas", display_with = "display_lempiras")]
    pub juridicas: f64,
}

impl GenderAmounts {
    pub fn add(&mut self, genero: Genero, amount: f64) {
        match genero {
            Genero::Male => self.hombres += amount,
            Genero::Female => self.mujeres += amount,
            Genero::Juridical => self.juridicas += amount,
            Genero::Unknown => {}
        }
    }

    pub fn total(&self) -> f64 {
        self.hombres + self.mujeres + self.juridicas
    }
}

/// Male/female composition of one organizational group. `total` counts every
/// member of the group, whatever their category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct GroupCounts {
    pub hombres: usize,
    pub mujeres: usize,
    pub total: usize,
}

impl GroupCounts {
    pub fn add(&mut self, genero: Genero) {
        match genero {
            Genero::Male => self.hombres += 1,
            Genero::Female => self.mujeres += 1,
            _ => {}
        }
        self.total += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BoardParticipation {
    pub junta_directiva: GroupCounts,
    pub junta_vigilancia: GroupCounts,
    pub empleados: GroupCounts,
    pub funcionarios: GroupCounts,
}

impl BoardParticipation {
    /// Groups in display order with their labels.
    pub fn groups(&self) -> [(&'static str, GroupCounts); 4] {
        [
            ("Junta Directiva", self.junta_directiva),
            ("Junta Vigilancia", self.junta_vigilancia),
            ("Empleados", self.empleados),
            ("Funcionarios", self.funcionarios),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct BoardGroupRow {
    #[tabled(rename = "Grupo")]
    pub grupo: String,
    #[tabled(rename = "Hombres")]
    pub hombres: usize,
    #[tabled(rename = "Mujeres")]
    pub mujeres: usize,
    #[tabled(rename = "Total")]
    pub total: usize,
    #[tabled(rename = "% Hombres", display_with = "display_percent")]
    pub hombres_pct: Option<f64>,
    #[tabled(rename = "% Mujeres", display_with = "display_percent")]
    pub mujeres_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct CreditTypeRow {
    #[tabled(rename = "Id")]
    pub tipo_credito_id: i64,
    #[tabled(rename = "Tipo de crédito")]
    pub nombre: String,
    #[tabled(rename = "Hombres")]
    pub hombres: usize,
    #[tabled(rename = "Mujeres")]
    pub mujeres: usize,
    #[tabled(rename = "Personas Jurídicas")]
    pub juridicas: usize,
}

/// Portfolio of one department; `total` is in base units.
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct DepartmentPortfolioRow {
    #[tabled(rename = "Id")]
    pub id: i64,
    #[tabled(rename = "Departamento")]
    pub nombre: String,
    #[tabled(rename = "Cartera", display_with = "display_lempiras")]
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct DepartmentAffiliatesRow {
    #[tabled(rename = "Id")]
    pub id: i64,
    #[tabled(rename = "Departamento")]
    pub nombre: String,
    #[tabled(rename = "Hombres")]
    pub hombres: usize,
    #[tabled(rename = "Mujeres")]
    pub mujeres: usize,
    #[tabled(rename = "Personas Jurídicas")]
    pub juridicas: usize,
    #[tabled(rename = "Total")]
    pub total: usize,
}

/// Credit amounts of one age bracket, in millions of lempiras.
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct AgeGroupRow {
    #[tabled(rename = "Edad")]
    pub label: String,
    #[tabled(rename = "Hombres (Millones L)", display_with = "display_millions")]
    pub hombres: f64,
    #[tabled(rename = "Mujeres (Millones L)", display_with = "display_millions")]
    pub mujeres: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct GenderCreditStats {
    #[tabled(rename = "Categoría")]
    pub genero: Genero,
    #[tabled(rename = "Créditos")]
    pub count: usize,
    #[tabled(rename = "Saldo", display_with = "display_lempiras")]
    pub sum: f64,
    #[tabled(rename = "Saldo promedio", display_with = "display_lempiras")]
    pub avg: f64,
    #[tabled(rename = "% Créditos", display_with = "display_percent")]
    pub share_pct: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreditStats {
    pub total: usize,
    pub hombres: GenderCreditStats,
    pub mujeres: GenderCreditStats,
    pub juridicas: GenderCreditStats,
    /// Mean balance across every credit, in base units.
    pub avg_balance: Option<f64>,
}

impl CreditStats {
    pub fn rows(&self) -> Vec<GenderCreditStats> {
        vec![self.hombres.clone(), self.mujeres.clone(), self.juridicas.clone()]
    }
}

/// Values behind the executive dashboard tiles.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardKpis {
    pub active_cooperatives: usize,
    pub active_affiliates: usize,
    pub female_affiliates_pct: Option<f64>,
    pub women_in_boards_pct: Option<f64>,
    pub below_board_parity: bool,
    pub total_loan_portfolio: f64,
    pub total_savings: f64,
    pub total_remittances_usd: f64,
}

/// Two-column rendering of the KPI tiles for console previews.
#[derive(Debug, Clone, Serialize, Tabled)]
pub struct KpiRow {
    #[serde(rename = "Indicador")]
    #[tabled(rename = "Indicador")]
    pub indicator: String,
    #[serde(rename = "Valor")]
    #[tabled(rename = "Valor")]
    pub value: String,
}
