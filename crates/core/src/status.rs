//! Derived chef availability view.

use serde::Serialize;

use crate::ledger::{Chef, ChefStatus};

/// An OPEN chef as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenChef {
    pub id: String,
    pub name: String,
}

/// Snapshot of which chefs can take orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusProjection {
    pub open_chefs: Vec<OpenChef>,
    pub open: usize,
    pub busy: usize,
    pub closed: usize,
    pub total: usize,
    /// Seats shown on the dashboard, e.g. "2/4 chefs open".
    pub capacity: usize,
}

impl StatusProjection {
    /// Compute the projection from a ledger snapshot.
    pub fn from_chefs(chefs: &[Chef], capacity: usize) -> Self {
        let mut open_chefs = Vec::new();
        let (mut busy, mut closed) = (0, 0);

        for chef in chefs {
            match chef.status {
                ChefStatus::Open => open_chefs.push(OpenChef {
                    id: chef.id.clone(),
                    name: chef.name.clone(),
                }),
                ChefStatus::Busy => busy += 1,
                ChefStatus::Closed => closed += 1,
            }
        }

        Self {
            open: open_chefs.len(),
            open_chefs,
            busy,
            closed,
            total: chefs.len(),
            capacity,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open > 0
    }

    /// Dashboard text posted to the status channel.
    pub fn render(&self) -> String {
        let headline = if self.is_open() {
            format!("OPEN - {}/{} chefs open", self.open, self.capacity)
        } else {
            "CLOSED - no chefs available".to_string()
        };

        let mut text = format!("Order desk status: {}", headline);
        for chef in &self.open_chefs {
            text.push_str(&format!("\n- {}", chef.name));
        }
        if self.busy > 0 {
            text.push_str(&format!("\n{} busy", self.busy));
        }
        text
    }
}
