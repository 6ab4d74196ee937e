/// Instruction indices to pause at. Kept sorted, without duplicates.
#[derive(Debug, Default)]
pub struct Breakpoints(Vec<usize>);

impl Breakpoints {
    pub fn contains(&self, index: usize) -> bool {
        self.0.binary_search(&index).is_ok()
    }

    /// Returns `false` if a breakpoint already exists at `index`.
    pub fn insert(&mut self, index: usize) -> bool {
        match self.0.binary_search(&index) {
            Ok(_) => false,
            Err(position) => {
                self.0.insert(position, index);
                true
            }
        }
    }

    /// Returns whether a breakpoint was found at `index`.
    pub fn remove(&mut self, index: usize) -> bool {
        match self.0.binary_search(&index) {
            Ok(position) => {
                self.0.remove(position);
                true
            }
            Err(_) => false,
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &usize> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a Breakpoints {
    type Item = &'a usize;
    type IntoIter = std::slice::Iter<'a, usize>;
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorted_and_unique() {
        let mut breakpoints = Breakpoints::default();
        assert!(breakpoints.insert(5));
        assert!(breakpoints.insert(1));
        assert!(!breakpoints.insert(5));
        assert_eq!(breakpoints.iter().copied().collect::<Vec<_>>(), vec![1, 5]);
        assert!(breakpoints.contains(1));
        assert!(breakpoints.remove(1));
        assert!(!breakpoints.remove(1));
        assert_eq!(breakpoints.len(), 1);
    }
}
