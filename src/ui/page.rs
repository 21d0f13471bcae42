use std::collections::VecDeque;
use std::fmt;

use indexmap::{IndexMap, IndexSet};
use tracing::debug;

use crate::common::Button;
use crate::error::AppError;
use crate::ui::check::CheckCondition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(&'static str);

impl PageId {
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// A screen of the application.
///
/// `check` is `None` for synthetic pages that are never recognized directly.
/// `links` maps each neighbour to the element that leads there, in declaration order.
#[derive(Debug, Clone)]
pub struct Page {
    id: PageId,
    check: Option<CheckCondition>,
    links: IndexMap<PageId, Button>,
}

impl Page {
    pub fn id(&self) -> PageId {
        self.id
    }

    pub fn check(&self) -> Option<&CheckCondition> {
        self.check.as_ref()
    }

    pub fn links(&self) -> impl Iterator<Item = (&PageId, &Button)> {
        self.links.iter()
    }

    pub fn link(&self, to: PageId) -> Option<&Button> {
        self.links.get(&to)
    }
}

/// Static page declarations, immutable once built.
#[derive(Debug, Clone)]
pub struct PageGraph {
    pages: IndexMap<PageId, Page>,
}

impl PageGraph {
    pub fn builder() -> PageGraphBuilder {
        PageGraphBuilder::default()
    }

    pub fn page(&self, id: PageId) -> Result<&Page, AppError> {
        self.pages
            .get(&id)
            .ok_or_else(|| AppError::UndeclaredPage(id.to_string()))
    }

    pub fn contains(&self, id: PageId) -> bool {
        self.pages.contains_key(&id)
    }

    /// Looks a page up by its name, e.g. from the command line.
    pub fn find(&self, name: &str) -> Option<PageId> {
        self.pages.keys().copied().find(|id| id.name() == name)
    }

    /// Pages in declaration order. Restartable.
    pub fn iter_pages(&self) -> impl Iterator<Item = &Page> {
        self.pages.values()
    }

    pub fn page_names(&self) -> Vec<String> {
        self.pages.keys().map(|id| id.to_string()).collect()
    }

    /// Every button used by some page check, deduplicated.
    pub fn check_buttons(&self) -> Vec<Button> {
        let buttons: IndexSet<Button> = self
            .iter_pages()
            .filter_map(|page| page.check())
            .flat_map(|check| check.buttons())
            .collect();
        buttons.into_iter().collect()
    }

    /// Next hop towards `destination` for every page that can reach it.
    ///
    /// Walks backwards from the destination breadth first. Among pages at the
    /// same distance, and among several links out of one page, declaration
    /// order decides, so the same graph always yields the same table.
    pub fn route_to(&self, destination: PageId) -> Result<RoutingTable, AppError> {
        self.page(destination)?;

        let mut next_hop = IndexMap::new();
        let mut visited = IndexSet::new();
        let mut queue = VecDeque::new();
        visited.insert(destination);
        queue.push_back(destination);

        while let Some(target) = queue.pop_front() {
            for page in self.iter_pages() {
                if visited.contains(&page.id) || !page.links.contains_key(&target) {
                    continue;
                }
                next_hop.insert(page.id, target);
                visited.insert(page.id);
                queue.push_back(page.id);
            }
        }

        debug!(
            "Route to {}: {} pages connected",
            destination,
            next_hop.len()
        );
        Ok(RoutingTable {
            destination,
            next_hop,
        })
    }
}

/// Per-traversal parent map. Dropping it is the end of the traversal's routing state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingTable {
    destination: PageId,
    next_hop: IndexMap<PageId, PageId>,
}

impl RoutingTable {
    pub fn destination(&self) -> PageId {
        self.destination
    }

    pub fn next_hop(&self, from: PageId) -> Option<PageId> {
        self.next_hop.get(&from).copied()
    }

    pub fn len(&self) -> usize {
        self.next_hop.len()
    }

    pub fn is_empty(&self) -> bool {
        self.next_hop.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PageId, PageId)> + '_ {
        self.next_hop.iter().map(|(from, to)| (*from, *to))
    }
}

#[derive(Default)]
pub struct PageGraphBuilder {
    pages: IndexMap<PageId, Page>,
    links: Vec<(PageId, PageId, Button)>,
    duplicates: Vec<PageId>,
}

impl PageGraphBuilder {
    pub fn page(mut self, id: PageId, check: Option<CheckCondition>) -> Self {
        if self.pages.contains_key(&id) {
            self.duplicates.push(id);
            return self;
        }
        self.pages.insert(
            id,
            Page {
                id,
                check,
                links: IndexMap::new(),
            },
        );
        self
    }

    pub fn link(mut self, from: PageId, to: PageId, button: Button) -> Self {
        self.links.push((from, to, button));
        self
    }

    pub fn build(mut self) -> Result<PageGraph, AppError> {
        if let Some(id) = self.duplicates.first() {
            return Err(AppError::InvalidGraph(format!("Page {} declared twice", id)));
        }
        for (from, to, button) in self.links {
            if !self.pages.contains_key(&to) {
                return Err(AppError::InvalidGraph(format!(
                    "Link {} -> {} points to an undeclared page",
                    from, to
                )));
            }
            let page = self.pages.get_mut(&from).ok_or_else(|| {
                AppError::InvalidGraph(format!("Link {} -> {} starts at an undeclared page", from, to))
            })?;
            if page.links.insert(to, button).is_some() {
                return Err(AppError::InvalidGraph(format!(
                    "Link {} -> {} declared twice",
                    from, to
                )));
            }
        }
        Ok(PageGraph { pages: self.pages })
    }
}
