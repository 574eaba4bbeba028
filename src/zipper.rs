// SPDX-License-Identifier: Apache-2.0

//! Immutable zipper: a focus into a [`Value`] tree with pure, functional
//! set/delete.
//!
//! Values are immutable; every edit through the zipper yields a new root.
//! Each frame bundles the parent compound node *as it was at the moment of
//! descent* together with a locator identifying which child is focused;
//! `set`/`delete` rebuild the path from the focus back up to the root,
//! leaving every untouched sibling shared structurally.

use indexmap::IndexMap;
use tracing::trace;

use crate::value::Value;

/// Identifies which child of a compound `Value` a zipper frame is focused
/// on. The `Display` impl is used only for diagnostic tracing of zipper
/// descents, never parsed back.
#[derive(Debug, Clone, PartialEq, Eq, strum_macros::Display)]
pub enum Locator {
    #[strum(to_string = "args[{0}]")]
    ClassArgument(usize),
    #[strum(to_string = "args[{0}]")]
    StaticMethodArgument(usize),
    #[strum(to_string = ".{0}")]
    StructField(String),
    #[strum(to_string = "[{0}]")]
    MapEntry(String),
    #[strum(to_string = "[{0}]")]
    ArrayElement(usize),
}

/// One frame of the zipper stack: the parent node as it existed when we
/// descended into it, plus the locator of the child we focused.
#[derive(Debug, Clone)]
pub struct ValueLoc {
    pub parent: Value,
    pub locator: Locator,
}

/// A stack of frames, innermost last. An empty zipper denotes the root
/// position.
#[derive(Debug, Clone, Default)]
pub struct Zipper {
    frames: Vec<ValueLoc>,
}

impl Zipper {
    pub fn root() -> Self {
        Zipper { frames: Vec::new() }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Pushes a new frame, focusing on `locator` within `parent`.
    pub fn descend(&self, parent: Value, locator: Locator) -> Zipper {
        trace!(locator = %locator, depth = self.frames.len() + 1, "zipper descend");
        let mut frames = self.frames.clone();
        frames.push(ValueLoc { parent, locator });
        Zipper { frames }
    }

    /// Sets the focus to `value` and rebuilds every ancestor up to the
    /// root. For struct fields and map entries this is an upsert (works
    /// whether or not the key previously existed); for arrays and argument
    /// lists, setting at the current length appends, and setting within
    /// bounds overwrites in place.
    pub fn set(&self, value: Value) -> Value {
        let mut current = value;
        for frame in self.frames.iter().rev() {
            current = place_child(frame.parent.clone(), &frame.locator, current);
        }
        current
    }

    /// Deletes the focused slot and rebuilds every ancestor up to the
    /// root. Struct/map deletion removes the entry; array/argument-list
    /// deletion removes the slot and re-indexes subsequent elements.
    ///
    /// Panics if called on the root zipper (there is no focus to delete).
    pub fn delete(&self) -> Value {
        let (last, rest) = self
            .frames
            .split_last()
            .expect("cannot delete the root of a zipper");
        let mut current = remove_child(last.parent.clone(), &last.locator);
        for frame in rest.iter().rev() {
            current = place_child(frame.parent.clone(), &frame.locator, current);
        }
        current
    }
}

fn place_child(parent: Value, locator: &Locator, child: Value) -> Value {
    match (parent, locator) {
        (
            Value::ClassInstantiation {
                dist_ptr,
                fqn,
                parameter_names,
                mut arguments,
            },
            Locator::ClassArgument(i),
        ) => {
            set_positional(&mut arguments, *i, child);
            Value::ClassInstantiation {
                dist_ptr,
                fqn,
                parameter_names,
                arguments,
            }
        }
        (
            Value::StaticMethodCall {
                dist_ptr,
                fqn,
                static_method,
                target_fqn,
                parameter_names,
                mut arguments,
            },
            Locator::StaticMethodArgument(i),
        ) => {
            set_positional(&mut arguments, *i, child);
            Value::StaticMethodCall {
                dist_ptr,
                fqn,
                static_method,
                target_fqn,
                parameter_names,
                arguments,
            }
        }
        (
            Value::StructLiteral {
                dist_ptr,
                fqn,
                mut entries,
            },
            Locator::StructField(name),
        ) => {
            entries.insert(name.clone(), child);
            Value::StructLiteral {
                dist_ptr,
                fqn,
                entries,
            }
        }
        (
            Value::MapLiteral {
                dist_ptr,
                mut entries,
            },
            Locator::MapEntry(key),
        ) => {
            entries.insert(key.clone(), child);
            Value::MapLiteral { dist_ptr, entries }
        }
        (
            Value::ArrayValue {
                dist_ptr,
                mut elements,
            },
            Locator::ArrayElement(i),
        ) => {
            set_positional(&mut elements, *i, child);
            Value::ArrayValue { dist_ptr, elements }
        }
        (parent, locator) => {
            panic!("zipper locator {locator:?} does not match parent node {parent:?}")
        }
    }
}

fn remove_child(parent: Value, locator: &Locator) -> Value {
    match (parent, locator) {
        (
            Value::ClassInstantiation {
                dist_ptr,
                fqn,
                parameter_names,
                mut arguments,
            },
            Locator::ClassArgument(i),
        ) => {
            arguments.remove(*i);
            Value::ClassInstantiation {
                dist_ptr,
                fqn,
                parameter_names,
                arguments,
            }
        }
        (
            Value::StaticMethodCall {
                dist_ptr,
                fqn,
                static_method,
                target_fqn,
                parameter_names,
                mut arguments,
            },
            Locator::StaticMethodArgument(i),
        ) => {
            arguments.remove(*i);
            Value::StaticMethodCall {
                dist_ptr,
                fqn,
                static_method,
                target_fqn,
                parameter_names,
                arguments,
            }
        }
        (
            Value::StructLiteral {
                dist_ptr,
                fqn,
                mut entries,
            },
            Locator::StructField(name),
        ) => {
            entries.shift_remove(name);
            Value::StructLiteral {
                dist_ptr,
                fqn,
                entries,
            }
        }
        (
            Value::MapLiteral {
                dist_ptr,
                mut entries,
            },
            Locator::MapEntry(key),
        ) => {
            entries.shift_remove(key);
            Value::MapLiteral { dist_ptr, entries }
        }
        (
            Value::ArrayValue {
                dist_ptr,
                mut elements,
            },
            Locator::ArrayElement(i),
        ) => {
            elements.remove(*i);
            Value::ArrayValue { dist_ptr, elements }
        }
        (parent, locator) => {
            panic!("zipper locator {locator:?} does not match parent node {parent:?}")
        }
    }
}

fn set_positional(slots: &mut Vec<Value>, index: usize, child: Value) {
    if index < slots.len() {
        slots[index] = child;
    } else {
        slots.insert(index.min(slots.len()), child);
    }
}

#[allow(dead_code)]
fn read_at<'a>(parent: &'a Value, locator: &Locator) -> Option<&'a Value> {
    match (parent, locator) {
        (Value::ClassInstantiation { arguments, .. }, Locator::ClassArgument(i))
        | (Value::StaticMethodCall { arguments, .. }, Locator::StaticMethodArgument(i)) => {
            arguments.get(*i)
        }
        (Value::StructLiteral { entries, .. }, Locator::StructField(name)) => entries.get(name),
        (Value::MapLiteral { entries, .. }, Locator::MapEntry(key)) => entries.get(key),
        (Value::ArrayValue { elements, .. }, Locator::ArrayElement(i)) => elements.get(*i),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{DistPtr, Primitive};

    fn ptr(i: usize) -> DistPtr {
        DistPtr {
            dist_id: "d".into(),
            source_index: i,
        }
    }

    fn prim(s: &str) -> Value {
        Value::PrimitiveValue {
            dist_ptr: ptr(0),
            payload: Primitive::String(s.into()),
        }
    }

    fn sample_array() -> Value {
        Value::ArrayValue {
            dist_ptr: ptr(0),
            elements: vec![prim("a"), prim("b"), prim("c")],
        }
    }

    #[test]
    fn set_then_read_at_same_path_yields_set_value() {
        let root = sample_array();
        let z = Zipper::root().descend(root.clone(), Locator::ArrayElement(1));
        let new_root = z.set(prim("X"));
        if let Value::ArrayValue { elements, .. } = &new_root {
            assert_eq!(elements[1], prim("X"));
            assert_eq!(elements[0], prim("a"));
            assert_eq!(elements[2], prim("c"));
        } else {
            panic!("expected array");
        }
        // original root untouched (functional update).
        if let Value::ArrayValue { elements, .. } = &root {
            assert_eq!(elements[1], prim("b"));
        }
    }

    #[test]
    fn set_never_mutates_input_root() {
        let root = sample_array();
        let root_before = root.clone();
        let z = Zipper::root().descend(root.clone(), Locator::ArrayElement(0));
        let _ = z.set(prim("X"));
        assert_eq!(root, root_before);
    }

    #[test]
    fn set_at_array_length_appends() {
        let root = sample_array();
        let z = Zipper::root().descend(root, Locator::ArrayElement(3));
        let new_root = z.set(prim("d"));
        if let Value::ArrayValue { elements, .. } = new_root {
            assert_eq!(elements.len(), 4);
            assert_eq!(elements[3], prim("d"));
        } else {
            panic!("expected array");
        }
    }

    #[test]
    fn delete_removes_and_reindexes_array_slot() {
        let root = sample_array();
        let z = Zipper::root().descend(root, Locator::ArrayElement(1));
        let new_root = z.delete();
        if let Value::ArrayValue { elements, .. } = new_root {
            assert_eq!(elements, vec![prim("a"), prim("c")]);
        } else {
            panic!("expected array");
        }
    }

    #[test]
    fn delete_then_set_same_key_is_equivalent_to_set_alone_for_structs() {
        let mut entries = IndexMap::new();
        entries.insert("name".to_string(), prim("old"));
        entries.insert("count".to_string(), prim("n"));
        let root = Value::StructLiteral {
            dist_ptr: ptr(0),
            fqn: "M.Props".into(),
            entries,
        };

        let z = Zipper::root().descend(root.clone(), Locator::StructField("name".into()));
        let set_alone = z.set(prim("new"));

        let deleted = z.delete();
        let z2 = Zipper::root().descend(deleted, Locator::StructField("name".into()));
        let delete_then_set = z2.set(prim("new"));

        // IndexMap's PartialEq ignores insertion order, so both paths
        // produce the same key -> value mapping regardless of where the
        // re-inserted key lands positionally.
        assert_eq!(set_alone, delete_then_set);
    }

    #[test]
    fn delete_then_append_restores_array_length() {
        let root = sample_array();
        let z = Zipper::root().descend(root, Locator::ArrayElement(2));
        let shrunk = z.delete();
        let len_before = match &shrunk {
            Value::ArrayValue { elements, .. } => elements.len(),
            _ => unreachable!(),
        };
        let z2 = Zipper::root().descend(shrunk, Locator::ArrayElement(len_before));
        let restored = z2.set(prim("c"));
        if let Value::ArrayValue { elements, .. } = restored {
            assert_eq!(elements.len(), 3);
        } else {
            panic!("expected array");
        }
    }

    #[test]
    fn deep_descend_rebuilds_nested_struct() {
        let inner = Value::StructLiteral {
            dist_ptr: ptr(0),
            fqn: "M.Inner".into(),
            entries: IndexMap::from([("x".to_string(), prim("1"))]),
        };
        let outer = Value::ClassInstantiation {
            dist_ptr: ptr(0),
            fqn: "M.Outer".into(),
            parameter_names: vec!["inner".into()],
            arguments: vec![inner.clone()],
        };

        let z1 = Zipper::root().descend(outer.clone(), Locator::ClassArgument(0));
        let z2 = z1.descend(inner, Locator::StructField("x".into()));
        let new_root = z2.set(prim("2"));

        if let Value::ClassInstantiation { arguments, .. } = new_root {
            if let Value::StructLiteral { entries, .. } = &arguments[0] {
                assert_eq!(entries.get("x"), Some(&prim("2")));
            } else {
                panic!("expected struct");
            }
        } else {
            panic!("expected class instantiation");
        }
    }
}
