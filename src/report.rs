use std::fmt;
use std::fmt::{Display, Formatter};
use itertools::Itertools;
use crate::expr::Eval;
use crate::graph::{IrGraph, VarId, VarKind};
use crate::memory::MemoryModel;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Shown {
    Hex(i64),
    Dec(i64),
    Null,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct ReportLine {
    pub id: VarId,
    pub kind: VarKind,
    pub label: String,
    pub value: Shown,
}

/// Snapshot of every variable that evaluates to a numeral: objects first,
/// then values, each in ascending id order. Objects show what is stored at
/// their address rather than the address itself.
#[derive(Clone, Debug)]
pub struct StateReport {
    pub lines: Vec<ReportLine>,
    label_width: usize,
}

impl StateReport {
    pub fn collect<G: IrGraph>(model: &MemoryModel<G>) -> Self {
        let store = model.store();
        let alloc = model.allocator();
        let show = |n: i64| if alloc.is_address(n) { Shown::Hex(n) } else { Shown::Dec(n) };
        let mut lines = vec![];
        for id in store.ids() {
            let (kind, expr) = match (model.graph().kind(id), store.lookup(id)) {
                (Ok(kind), Ok(expr)) => (kind, expr),
                _ => continue,
            };
            let value = match store.evaluate(&expr) {
                Eval::Numeral(n) => n,
                Eval::Symbolic => continue,
            };
            let line = match kind {
                VarKind::Value => ReportLine {
                    id,
                    kind,
                    label: format!("ValVar{}", id.0),
                    value: show(value),
                },
                VarKind::Object => {
                    let content = if alloc.is_address(value) {
                        store.written(value as u32)
                            .and_then(|c| store.evaluate(c).numeral())
                            .map_or(Shown::Null, show)
                    } else {
                        Shown::Null
                    };
                    // constant objects may sit beyond the addressable id range
                    let label = match alloc.peek(id) {
                        Ok(address) => format!("ObjVar{} ({:#x}) ", id.0, address),
                        Err(_) => format!("ObjVar{} ", id.0),
                    };
                    ReportLine {
                        id,
                        kind,
                        label,
                        value: content,
                    }
                }
            };
            lines.push(line);
        }
        let lines = lines.into_iter()
            .sorted_by_key(|line| (line.kind == VarKind::Value, line.id))
            .collect();
        StateReport { lines, label_width: model.config().label_width }
    }
}

impl Display for Shown {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Shown::Hex(n) => write!(f, "{:#x}", n),
            Shown::Dec(n) => write!(f, "{}", n),
            Shown::Null => write!(f, "NULL"),
        }
    }
}

impl Display for StateReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "-----------SVFVar and Value-----------")?;
        for line in self.lines.iter() {
            writeln!(f, "{:<width$}\t Value: {}", line.label, line.value, width = self.label_width)?;
        }
        writeln!(f, "-----------------------------------------")
    }
}
