//! Shape-inferring output container
//!
//! A [`Container`] starts out unset and becomes either a list or a map the
//! first time it is used in a way that needs one. Once fixed, the shape
//! never changes; using a list operation on a map (or the reverse) fails
//! with [`Error::TypeConflict`].
//!
//! Containers are shared handles: cloning one yields another reference to
//! the same storage. This is what lets a rule append the current scope's
//! container to an ancestor's list and keep filling it afterwards.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{Error, Result};

/// How many nulls a single indexed write may insert past the end of a list.
pub const MAX_LIST_PADDING: usize = 4096;

/// The shape a container has been fixed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Unset,
    List,
    Map,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unset => "unset",
            Self::List => "list",
            Self::Map => "map",
        })
    }
}

/// Index into a container: integers address lists, names address maps.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Index(usize),
    Name(String),
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

/// A value stored in a container: a plain scalar or a nested container.
#[derive(Debug, Clone)]
pub enum Item {
    Value(Value),
    Container(Container),
}

impl Item {
    pub fn as_container(&self) -> Option<&Container> {
        match self {
            Self::Container(container) => Some(container),
            Self::Value(_) => None,
        }
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            Self::Container(_) => None,
        }
    }

    pub fn to_plain(&self) -> Value {
        self.plain_within(&mut Vec::new())
    }

    fn plain_within(&self, open: &mut Vec<*const RefCell<Storage>>) -> Value {
        match self {
            Self::Value(value) => value.clone(),
            Self::Container(container) => container.plain_within(open),
        }
    }
}

impl From<Container> for Item {
    fn from(container: Container) -> Self {
        Self::Container(container)
    }
}

impl From<&Container> for Item {
    fn from(container: &Container) -> Self {
        Self::Container(container.clone())
    }
}

impl From<Value> for Item {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<&str> for Item {
    fn from(value: &str) -> Self {
        Self::Value(Value::String(value.to_string()))
    }
}

impl From<String> for Item {
    fn from(value: String) -> Self {
        Self::Value(Value::String(value))
    }
}

impl From<i32> for Item {
    fn from(value: i32) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<i64> for Item {
    fn from(value: i64) -> Self {
        Self::Value(Value::from(value))
    }
}

impl From<bool> for Item {
    fn from(value: bool) -> Self {
        Self::Value(Value::Bool(value))
    }
}

#[derive(Default)]
enum Storage {
    #[default]
    Unset,
    List(Vec<Item>),
    Map(HashMap<String, Item>),
}

impl Storage {
    fn shape(&self) -> Shape {
        match self {
            Self::Unset => Shape::Unset,
            Self::List(_) => Shape::List,
            Self::Map(_) => Shape::Map,
        }
    }

    fn list(&mut self) -> Result<&mut Vec<Item>> {
        if let Self::Unset = self {
            *self = Self::List(Vec::new());
        }
        match self {
            Self::List(items) => Ok(items),
            other => Err(Error::type_conflict(other.shape(), Shape::List)),
        }
    }

    fn map(&mut self) -> Result<&mut HashMap<String, Item>> {
        if let Self::Unset = self {
            *self = Self::Map(HashMap::new());
        }
        match self {
            Self::Map(entries) => Ok(entries),
            other => Err(Error::type_conflict(other.shape(), Shape::Map)),
        }
    }
}

/// Lazily typed list-or-map value used to accumulate transformation output.
#[derive(Clone, Default)]
pub struct Container {
    storage: Rc<RefCell<Storage>>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shape(&self) -> Shape {
        self.storage.borrow().shape()
    }

    pub fn is_list(&self) -> bool {
        self.shape() == Shape::List
    }

    pub fn is_map(&self) -> bool {
        self.shape() == Shape::Map
    }

    /// Whether both handles refer to the same storage.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.storage, &other.storage)
    }

    /// Reads an element (list) or entry (map).
    ///
    /// A name that is not present yet is filled with a fresh unset
    /// container, so the result is only `None` for a list index past the end.
    pub fn get(&self, key: impl Into<Key>) -> Result<Option<Item>> {
        match key.into() {
            Key::Index(index) => Ok(self.storage.borrow_mut().list()?.get(index).cloned()),
            Key::Name(name) => self.attr(&name).map(Some),
        }
    }

    /// Stores a value at an index (list) or under a name (map).
    ///
    /// Writing past the end of a list pads it with nulls, up to
    /// [`MAX_LIST_PADDING`] at a time; further out fails with
    /// [`Error::IndexOutOfRange`].
    pub fn set(&self, key: impl Into<Key>, value: impl Into<Item>) -> Result<()> {
        match key.into() {
            Key::Index(index) => {
                let mut storage = self.storage.borrow_mut();
                let items = storage.list()?;
                if index >= items.len() {
                    if index - items.len() > MAX_LIST_PADDING {
                        return Err(Error::index_out_of_range(index, items.len()));
                    }
                    items.resize(index + 1, Item::Value(Value::Null));
                }
                items[index] = value.into();
                Ok(())
            }
            Key::Name(name) => self.set_attr(&name, value),
        }
    }

    /// Appending a container into itself, or into one of its own
    /// descendants, creates a reference cycle. It is never freed, and
    /// [`to_plain`](Self::to_plain) writes the looping entry as `null`.
    pub fn append(&self, value: impl Into<Item>) -> Result<()> {
        self.storage.borrow_mut().list()?.push(value.into());
        Ok(())
    }

    pub fn first(&self) -> Result<Option<Item>> {
        Ok(self.storage.borrow_mut().list()?.first().cloned())
    }

    pub fn has(&self, name: &str) -> Result<bool> {
        Ok(self.storage.borrow_mut().map()?.contains_key(name))
    }

    /// Attribute-style read: auto-creates an unset nested container.
    pub fn attr(&self, name: &str) -> Result<Item> {
        let mut storage = self.storage.borrow_mut();
        let item = storage
            .map()?
            .entry(name.to_string())
            .or_insert_with(|| Item::Container(Self::new()));
        Ok(item.clone())
    }

    /// Attribute-style write. Storing a container inside itself creates a
    /// cycle; see [`append`](Self::append).
    pub fn set_attr(&self, name: &str, value: impl Into<Item>) -> Result<()> {
        self.storage
            .borrow_mut()
            .map()?
            .insert(name.to_string(), value.into());
        Ok(())
    }

    /// Attribute read that must yield a nested container.
    pub fn child(&self, name: &str) -> Result<Self> {
        match self.attr(name)? {
            Item::Container(container) => Ok(container),
            Item::Value(_) => Err(Error::not_a_container(name)),
        }
    }

    /// Recursively materializes into plain JSON; unset becomes `null`.
    pub fn to_plain(&self) -> Value {
        self.plain_within(&mut Vec::new())
    }

    /// `open` holds the containers being materialized further up. Meeting
    /// one of them again means the data loops back on itself.
    fn plain_within(&self, open: &mut Vec<*const RefCell<Storage>>) -> Value {
        let id = Rc::as_ptr(&self.storage);
        if open.contains(&id) {
            warn!("Container contains itself; the cycle is materialized as null");
            return Value::Null;
        }

        open.push(id);
        let plain = match &*self.storage.borrow() {
            Storage::Unset => Value::Null,
            Storage::List(items) => {
                Value::Array(items.iter().map(|item| item.plain_within(open)).collect())
            }
            Storage::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(key, item)| (key.clone(), item.plain_within(open)))
                    .collect(),
            ),
        };
        open.pop();
        plain
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_plain() {
            Value::Null => f.write_str("<nil>"),
            plain => write!(f, "<{plain}>"),
        }
    }
}
