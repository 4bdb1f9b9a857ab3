//! Sorting direction.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Sorting order of the output sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Order {
    /// Smallest record first.
    Asc,
    /// Largest record first.
    Desc,
}

impl Order {
    /// Compares two items according to the order.
    pub fn compare<T: Ord>(self, a: &T, b: &T) -> Ordering {
        match self {
            Order::Asc => a.cmp(b),
            Order::Desc => b.cmp(a),
        }
    }

    /// Merge step predicate: returns `true` if the left item must be taken.
    /// Equal items always go left first, which keeps the merge stable.
    pub fn takes_left<T: Ord>(self, left: &T, right: &T) -> bool {
        match self {
            Order::Asc => left <= right,
            Order::Desc => left >= right,
        }
    }

    /// Checks that `items` is sorted according to the order.
    pub fn is_sorted<T: Ord>(self, items: &[T]) -> bool {
        items.windows(2).all(|pair| self.takes_left(&pair[0], &pair[1]))
    }
}

impl Default for Order {
    fn default() -> Self {
        Order::Asc
    }
}

impl fmt::Display for Order {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Order::Asc => write!(f, "asc"),
            Order::Desc => write!(f, "desc"),
        }
    }
}

impl FromStr for Order {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(Order::Asc),
            "desc" | "descending" => Ok(Order::Desc),
            other => Err(format!("unknown sorting order: {}", other)),
        }
    }
}

/// Direction-aware priority of a value.
///
/// The smallest priority always belongs to the value that must be emitted first,
/// so a single extract-minimum structure serves both orders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Priority<T> {
    value: T,
    order: Order,
}

impl<T> Priority<T> {
    pub fn new(value: T, order: Order) -> Self {
        Priority { value, order }
    }
}

impl<T: Ord> PartialOrd for Priority<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Ord> Ord for Priority<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order.compare(&self.value, &other.value)
    }
}
