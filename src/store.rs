use crate::types::{
    Affiliate, Cooperative, Credit, CreditType, Department, DepositType, Deposit, Director,
    Employee, Municipality, Officer, Remittance,
};

/// Every dataset loaded at start-up.
///
/// Built once by [`crate::loader::load_snapshot`] and only borrowed after
/// that, so all report functions see the same data for the whole run.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    // Catalogs
    pub departments: Vec<Department>,
    pub municipalities: Vec<Municipality>,
    pub cooperatives: Vec<Cooperative>,
    pub credit_types: Vec<CreditType>,
    pub deposit_types: Vec<DepositType>,
    // Transactional data
    pub credits: Vec<Credit>,
    pub deposits: Vec<Deposit>,
    pub remittances: Vec<Remittance>,
    // Organizational data
    pub affiliates: Vec<Affiliate>,
    pub directors: Vec<Director>,
    pub employees: Vec<Employee>,
    pub officers: Vec<Officer>,
}

impl Snapshot {
    /// Department name for `id`, or `Dept {id}` when the catalog has no entry.
    pub fn department_name(&self, id: i64) -> String {
        self.departments
            .iter()
            .find(|d| d.id == id)
            .map(|d| d.nombre.clone())
            .unwrap_or_else(|| format!("Dept {}", id))
    }

    pub fn total_records(&self) -> usize {
        self.departments.len()
            + self.municipalities.len()
            + self.cooperatives.len()
            + self.credit_types.len()
            + self.deposit_types.len()
            + self.credits.len()
            + self.deposits.len()
            + self.remittances.len()
            + self.affiliates.len()
            + self.directors.len()
            + self.employees.len()
            + self.officers.len()
    }
}
