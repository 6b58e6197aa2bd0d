//! Final view of a run's persistent storage.

use std::collections::BTreeMap;
use std::fmt;

use bitlang_checker::StaticEnvironment;
use bitlang_common::Value;

/// Every static and const after the run, keyed by qualified name:
/// `NAME` for globals and consts, `function::NAME` for function statics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Memory {
    slots: BTreeMap<String, Value>,
}

impl Memory {
    pub(crate) fn from_statics(statics: &StaticEnvironment) -> Self {
        let slots = statics
            .slots()
            .map(|(name, value)| (name, value.clone()))
            .collect();
        Self { slots }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.slots.get(name)
    }

    /// The value of a scalar slot, or of element `index` of an array slot.
    pub fn read(&self, name: &str, index: Option<u64>) -> Option<u64> {
        let value = self.get(name)?;
        match index {
            None => value.as_scalar().map(|(_, bits)| bits),
            Some(i) => value.element(i)?.as_scalar().map(|(_, bits)| bits),
        }
    }

    /// Slots in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.slots.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.slots
    }
}

/// One `NAME = value` line per slot.
impl fmt::Display for Memory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.slots {
            writeln!(f, "{name} = {value}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitlang_common::Width;

    fn memory() -> Memory {
        let mut slots = BTreeMap::new();
        slots.insert("RESULT".to_string(), Value::array(Width::U8, vec![233]).unwrap());
        slots.insert("COUNT".to_string(), Value::scalar(Width::U8, 13).unwrap());
        slots.insert(
            "fib::CACHE".to_string(),
            Value::array(Width::U8, vec![0, 1]).unwrap(),
        );
        Memory { slots }
    }

    #[test]
    fn read_scalars_and_elements() {
        let m = memory();
        assert_eq!(m.read("COUNT", None), Some(13));
        assert_eq!(m.read("RESULT", Some(0)), Some(233));
        assert_eq!(m.read("RESULT", Some(1)), None);
        assert_eq!(m.read("RESULT", None), None);
        assert_eq!(m.read("MISSING", None), None);
    }

    #[test]
    fn display_in_name_order() {
        assert_eq!(
            memory().to_string(),
            "COUNT = 13\nRESULT = [233]\nfib::CACHE = [0, 1]\n"
        );
    }
}
