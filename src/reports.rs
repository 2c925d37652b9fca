// Aggregation engine.
//
// Every function here is a pure read over the snapshot: no caching, no
// mutation, same answer on every call.
use crate::store::Snapshot;
use crate::types::{
    Affiliate, AgeGroupRow, BoardGroupRow, BoardParticipation, CreditStats, CreditTypeRow,
    DashboardKpis, DepartmentAffiliatesRow, DepartmentPortfolioRow, GenderAmounts, GenderCounts,
    GenderCreditStats, Genero, GroupCounts, OrganType,
};
use crate::util::{average, percent};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

const ACTIVE_COOPERATIVE: &str = "ACTIVA";
const ACTIVE_MEMBER: &str = "ACTIVO";

struct AgeBracket {
    label: &'static str,
    min: i64,
    max: i64,
}

const AGE_BRACKETS: [AgeBracket; 6] = [
    AgeBracket { label: "18-25", min: 18, max: 25 },
    AgeBracket { label: "26-35", min: 26, max: 35 },
    AgeBracket { label: "36-45", min: 36, max: 45 },
    AgeBracket { label: "46-55", min: 46, max: 55 },
    AgeBracket { label: "56-65", min: 56, max: 65 },
    AgeBracket { label: "65+", min: 66, max: 150 },
];

fn active_affiliates(snapshot: &Snapshot) -> impl Iterator<Item = &Affiliate> {
    snapshot.affiliates.iter().filter(|a| a.estado == ACTIVE_MEMBER)
}

pub fn count_active_cooperatives(snapshot: &Snapshot) -> usize {
    snapshot
        .cooperatives
        .iter()
        .filter(|c| c.estado == ACTIVE_COOPERATIVE)
        .count()
}

pub fn count_active_affiliates(snapshot: &Snapshot) -> usize {
    active_affiliates(snapshot).count()
}

/// Share of active affiliates whose category is `M`, or `None` when nobody
/// is active.
pub fn percent_female_affiliates(snapshot: &Snapshot) -> Option<f64> {
    let (females, total) = active_affiliates(snapshot).fold((0, 0), |(f, t), a| {
        (f + usize::from(a.genero == Genero::Female), t + 1)
    });
    percent(females, total)
}

/// Share of women across both boards. Directors carry no status column, so
/// every row counts.
pub fn percent_women_in_boards(snapshot: &Snapshot) -> Option<f64> {
    let females = snapshot
        .directors
        .iter()
        .filter(|d| d.genero == Genero::Female)
        .count();
    percent(females, snapshot.directors.len())
}

pub fn total_loan_portfolio(snapshot: &Snapshot) -> f64 {
    snapshot.credits.iter().map(|c| c.saldo_actual).sum()
}

pub fn total_savings(snapshot: &Snapshot) -> f64 {
    snapshot.deposits.iter().map(|d| d.saldo).sum()
}

/// Remittances in US dollars, base units.
pub fn total_remittances(snapshot: &Snapshot) -> f64 {
    snapshot.remittances.iter().map(|r| r.monto_usd).sum()
}

pub fn dashboard_kpis(snapshot: &Snapshot, parity_threshold: f64) -> DashboardKpis {
    let women_in_boards_pct = percent_women_in_boards(snapshot);
    DashboardKpis {
        active_cooperatives: count_active_cooperatives(snapshot),
        active_affiliates: count_active_affiliates(snapshot),
        female_affiliates_pct: percent_female_affiliates(snapshot),
        women_in_boards_pct,
        below_board_parity: women_in_boards_pct.is_some_and(|p| p < parity_threshold),
        total_loan_portfolio: total_loan_portfolio(snapshot),
        total_savings: total_savings(snapshot),
        total_remittances_usd: total_remittances(snapshot),
    }
}

pub fn gender_breakdown(snapshot: &Snapshot) -> GenderCounts {
    let mut counts = GenderCounts::default();
    for a in active_affiliates(snapshot) {
        counts.add(a.genero);
    }
    counts
}

/// One row per credit-type catalog entry, in catalog order.
///
/// Credits pointing at a type id the catalog does not know are left out; see
/// [`credits_with_unknown_type`] for how many.
pub fn credits_by_type_and_gender(snapshot: &Snapshot) -> Vec<CreditTypeRow> {
    snapshot
        .credit_types
        .iter()
        .map(|tipo| {
            let mut counts = GenderCounts::default();
            snapshot
                .credits
                .iter()
                .filter(|c| c.tipo_credito_id == Some(tipo.id))
                .for_each(|c| counts.add(c.genero));
            CreditTypeRow {
                tipo_credito_id: tipo.id,
                nombre: tipo.nombre.clone(),
                hombres: counts.hombres,
                mujeres: counts.mujeres,
                juridicas: counts.juridicas,
            }
        })
        .collect()
}

pub fn credits_with_unknown_type(snapshot: &Snapshot) -> usize {
    let known: HashSet<i64> = snapshot.credit_types.iter().map(|t| t.id).collect();
    snapshot
        .credits
        .iter()
        .filter(|c| !c.tipo_credito_id.is_some_and(|id| known.contains(&id)))
        .count()
}

pub fn credit_balances_by_gender(snapshot: &Snapshot) -> GenderAmounts {
    let mut sums = GenderAmounts::default();
    for c in &snapshot.credits {
        sums.add(c.genero, c.saldo_actual);
    }
    sums
}

pub fn credit_stats(snapshot: &Snapshot) -> CreditStats {
    let total = snapshot.credits.len();
    let mut counts = GenderCounts::default();
    let mut sums = GenderAmounts::default();
    for c in &snapshot.credits {
        counts.add(c.genero);
        sums.add(c.genero, c.saldo_actual);
    }
    let stats = |genero: Genero, count: usize, sum: f64| GenderCreditStats {
        genero,
        count,
        sum,
        avg: average(sum, count),
        share_pct: percent(count, total),
    };
    CreditStats {
        total,
        hombres: stats(Genero::Male, counts.hombres, sums.hombres),
        mujeres: stats(Genero::Female, counts.mujeres, sums.mujeres),
        juridicas: stats(Genero::Juridical, counts.juridicas, sums.juridicas),
        avg_balance: (total > 0).then(|| sums.total() / total as f64),
    }
}

/// Credit amounts (`monto`) per age bracket for men and women, in millions.
pub fn credits_by_age_group(snapshot: &Snapshot) -> Vec<AgeGroupRow> {
    AGE_BRACKETS
        .iter()
        .map(|bracket| {
            let mut sums = GenderAmounts::default();
            snapshot
                .credits
                .iter()
                .filter(|c| c.edad.is_some_and(|e| e >= bracket.min && e <= bracket.max))
                .for_each(|c| sums.add(c.genero, c.monto));
            AgeGroupRow {
                label: bracket.label.to_string(),
                hombres: sums.hombres / 1_000_000.0,
                mujeres: sums.mujeres / 1_000_000.0,
            }
        })
        .collect()
}

/// Credits that no age bracket picks up: missing age, or outside 18..=150.
pub fn credits_outside_age_brackets(snapshot: &Snapshot) -> usize {
    snapshot
        .credits
        .iter()
        .filter(|c| {
            !c.edad
                .is_some_and(|e| AGE_BRACKETS.iter().any(|b| e >= b.min && e <= b.max))
        })
        .count()
}

pub fn board_participation(snapshot: &Snapshot) -> BoardParticipation {
    let mut board = BoardParticipation::default();
    for d in &snapshot.directors {
        match d.tipo_organo {
            OrganType::JuntaDirectiva => board.junta_directiva.add(d.genero),
            OrganType::JuntaVigilancia => board.junta_vigilancia.add(d.genero),
            OrganType::Other => {}
        }
    }
    for e in snapshot.employees.iter().filter(|e| e.estado == ACTIVE_MEMBER) {
        board.empleados.add(e.genero);
    }
    for o in &snapshot.officers {
        board.funcionarios.add(o.genero);
    }
    board
}

/// Male and female share of each group's total.
pub fn board_shares(snapshot: &Snapshot) -> Vec<BoardGroupRow> {
    board_participation(snapshot)
        .groups()
        .into_iter()
        .map(|(label, g)| BoardGroupRow {
            grupo: label.to_string(),
            hombres: g.hombres,
            mujeres: g.mujeres,
            total: g.total,
            hombres_pct: percent(g.hombres, g.total),
            mujeres_pct: percent(g.mujeres, g.total),
        })
        .collect()
}

/// Women and men summed over boards, employees and officers.
pub fn positions_by_gender(snapshot: &Snapshot) -> GroupCounts {
    board_participation(snapshot)
        .groups()
        .iter()
        .fold(GroupCounts::default(), |acc, (_, g)| GroupCounts {
            hombres: acc.hombres + g.hombres,
            mujeres: acc.mujeres + g.mujeres,
            total: acc.total + g.total,
        })
}

/// Resolve names, order by `weight` descending and apply the optional limit.
///
/// Groups arrive ordered by department id and the sort is stable, so equal
/// weights stay in ascending id order.
fn rank_departments<A, R>(
    snapshot: &Snapshot,
    groups: BTreeMap<i64, A>,
    limit: Option<usize>,
    into_row: impl Fn(i64, String, A) -> R,
    weight: impl Fn(&R) -> f64,
) -> Vec<R> {
    let mut rows: Vec<R> = groups
        .into_iter()
        .map(|(id, acc)| into_row(id, snapshot.department_name(id), acc))
        .collect();
    rows.sort_by(|a, b| weight(b).partial_cmp(&weight(a)).unwrap_or(Ordering::Equal));
    if let Some(n) = limit {
        rows.truncate(n);
    }
    rows
}

/// Outstanding balance per department, largest first.
pub fn department_portfolio(
    snapshot: &Snapshot,
    limit: Option<usize>,
) -> Vec<DepartmentPortfolioRow> {
    let mut groups: BTreeMap<i64, f64> = BTreeMap::new();
    for c in &snapshot.credits {
        if let Some(id) = c.departamento_id {
            *groups.entry(id).or_insert(0.0) += c.saldo_actual;
        }
    }
    rank_departments(
        snapshot,
        groups,
        limit,
        |id, nombre, total| DepartmentPortfolioRow { id, nombre, total },
        |row| row.total,
    )
}

pub fn top_departments_by_portfolio(
    snapshot: &Snapshot,
    limit: usize,
) -> Vec<DepartmentPortfolioRow> {
    department_portfolio(snapshot, Some(limit))
}

/// Active affiliates per department, largest first. `total` includes members
/// with an unrecognized category.
pub fn affiliates_by_department(
    snapshot: &Snapshot,
    limit: Option<usize>,
) -> Vec<DepartmentAffiliatesRow> {
    let mut groups: BTreeMap<i64, (GenderCounts, usize)> = BTreeMap::new();
    for a in active_affiliates(snapshot) {
        if let Some(id) = a.departamento_id {
            let e = groups.entry(id).or_default();
            e.0.add(a.genero);
            e.1 += 1;
        }
    }
    rank_departments(
        snapshot,
        groups,
        limit,
        |id, nombre, (counts, total)| DepartmentAffiliatesRow {
            id,
            nombre,
            hombres: counts.hombres,
            mujeres: counts.mujeres,
            juridicas: counts.juridicas,
            total,
        },
        |row| row.total as f64,
    )
}
