use contracts::domain::a025_crm_deal::DealRow;

/// Every normalized deal of one Agendor snapshot, in fetch order.
///
/// Built once at startup and only read afterwards; a fresh fetch means a
/// fresh table.
#[derive(Debug, Clone, Default)]
pub struct MasterTable {
    rows: Vec<DealRow>,
}

impl MasterTable {
    pub fn new(rows: Vec<DealRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[DealRow] {
        &self.rows
    }

    /// Deals whose status is still open ("Em andamento")
    pub fn in_progress(&self) -> impl Iterator<Item = &DealRow> {
        self.rows.iter().filter(|row| row.is_in_progress())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
