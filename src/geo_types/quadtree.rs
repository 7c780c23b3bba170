use geo_types::{coord, Coord, Rect};

/// A rectangle (zero sized for a point) plus whatever the owner wants to
/// hang off it.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialEntry<T> {
    pub rect: Rect<f64>,
    pub payload: T,
}

impl<T> SpatialEntry<T> {
    pub fn point(point: Coord<f64>, payload: T) -> SpatialEntry<T> {
        SpatialEntry {
            rect: Rect::new(point, point),
            payload,
        }
    }

    /// Same x/y/w/h convention as the page: (x, y) is the min corner.
    pub fn rect(x: f64, y: f64, w: f64, h: f64, payload: T) -> SpatialEntry<T> {
        SpatialEntry {
            rect: Rect::new(coord! {x: x, y: y}, coord! {x: x + w, y: y + h}),
            payload,
        }
    }

    /// Distance from `point` to the nearest part of this entry's rect.
    /// Zero when the point is inside.
    pub fn distance_2(&self, point: &Coord<f64>) -> f64 {
        let min = self.rect.min();
        let max = self.rect.max();
        let dx = (min.x - point.x).max(0.).max(point.x - max.x);
        let dy = (min.y - point.y).max(0.).max(point.y - max.y);
        dx * dx + dy * dy
    }
}

/// Inclusive: touching edges count as overlapping.
pub fn rects_intersect(a: &Rect<f64>, b: &Rect<f64>) -> bool {
    a.min().x <= b.max().x && b.min().x <= a.max().x && a.min().y <= b.max().y && b.min().y <= a.max().y
}

fn rect_contains(outer: &Rect<f64>, inner: &Rect<f64>) -> bool {
    outer.min().x <= inner.min().x
        && outer.min().y <= inner.min().y
        && inner.max().x <= outer.max().x
        && inner.max().y <= outer.max().y
}

#[derive(Debug, Clone)]
struct QuadNode<T> {
    bounds: Rect<f64>,
    depth: usize,
    entries: Vec<SpatialEntry<T>>,
    children: Option<Box<[QuadNode<T>; 4]>>,
}

impl<T> QuadNode<T> {
    fn new(bounds: Rect<f64>, depth: usize) -> QuadNode<T> {
        QuadNode {
            bounds,
            depth,
            entries: vec![],
            children: None,
        }
    }

    fn child_for(&mut self, rect: &Rect<f64>) -> Option<&mut QuadNode<T>> {
        self.children
            .as_mut()
            .and_then(|children| children.iter_mut().find(|child| rect_contains(&child.bounds, rect)))
    }

    fn insert(&mut self, entry: SpatialEntry<T>, max_entries: usize, max_depth: usize) {
        if let Some(child) = self.child_for(&entry.rect) {
            child.insert(entry, max_entries, max_depth);
            return;
        }
        self.entries.push(entry);
        if self.children.is_none() && self.entries.len() > max_entries && self.depth < max_depth {
            self.split(max_entries, max_depth);
        }
    }

    fn split(&mut self, max_entries: usize, max_depth: usize) {
        let min = self.bounds.min();
        let max = self.bounds.max();
        let mid = self.bounds.center();
        let depth = self.depth + 1;
        self.children = Some(Box::new([
            QuadNode::new(Rect::new(min, mid), depth),
            QuadNode::new(Rect::new(coord! {x: mid.x, y: min.y}, coord! {x: max.x, y: mid.y}), depth),
            QuadNode::new(Rect::new(coord! {x: min.x, y: mid.y}, coord! {x: mid.x, y: max.y}), depth),
            QuadNode::new(Rect::new(mid, max), depth),
        ]));
        // Anything straddling a split line (or outside the root) stays here.
        for entry in std::mem::take(&mut self.entries) {
            match self.child_for(&entry.rect) {
                Some(child) => child.insert(entry, max_entries, max_depth),
                None => self.entries.push(entry),
            }
        }
    }

    fn visit<'a, F>(&'a self, rect: &Rect<f64>, visitor: &mut F) -> bool
    where
        F: FnMut(&'a SpatialEntry<T>) -> bool,
    {
        for entry in self.entries.iter() {
            if rects_intersect(&entry.rect, rect) && visitor(entry) {
                return true;
            }
        }
        if let Some(children) = &self.children {
            for child in children.iter() {
                if rects_intersect(&child.bounds, rect) && child.visit(rect, visitor) {
                    return true;
                }
            }
        }
        false
    }
}

/// Insert-and-range-query index over a fixed area (normally the page).
/// Entries outside the area are still accepted; they just live in the root.
#[derive(Debug, Clone)]
pub struct QuadTree<T> {
    root: QuadNode<T>,
    max_entries: usize,
    max_depth: usize,
    len: usize,
}

impl<T> QuadTree<T> {
    pub fn new(bounds: Rect<f64>) -> QuadTree<T> {
        QuadTree {
            root: QuadNode::new(bounds, 0),
            max_entries: 16,
            max_depth: 12,
            len: 0,
        }
    }

    /// Entries a node may hold before it splits.
    pub fn with_node_capacity(self, max_entries: usize) -> Self {
        QuadTree {
            max_entries: max_entries.max(1),
            ..self
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn insert(&mut self, entry: SpatialEntry<T>) {
        self.root.insert(entry, self.max_entries, self.max_depth);
        self.len += 1;
    }

    /// Every entry whose rect touches `rect`, in no particular order.
    pub fn query(&self, rect: &Rect<f64>) -> Vec<&SpatialEntry<T>> {
        let mut found = vec![];
        self.root.visit(rect, &mut |entry| {
            found.push(entry);
            false
        });
        found
    }

    /// Short-circuiting version of [`QuadTree::query`]: stops at the first
    /// entry touching `rect` for which `predicate` holds.
    pub fn any<F>(&self, rect: &Rect<f64>, mut predicate: F) -> bool
    where
        F: FnMut(&SpatialEntry<T>) -> bool,
    {
        self.root.visit(rect, &mut |entry| predicate(entry))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn page() -> Rect<f64> {
        Rect::new(coord! {x: 0., y: 0.}, coord! {x: 100., y: 100.})
    }

    #[test]
    fn test_query_matches_brute_force() {
        let mut rng = SmallRng::seed_from_u64(3);
        let mut tree = QuadTree::new(page()).with_node_capacity(4);
        let mut all = vec![];
        for i in 0..2000usize {
            let entry = if i % 3 == 0 {
                SpatialEntry::rect(
                    rng.gen_range(0.0..95.0),
                    rng.gen_range(0.0..95.0),
                    rng.gen_range(0.0..5.0),
                    rng.gen_range(0.0..5.0),
                    i,
                )
            } else {
                SpatialEntry::point(coord! {x: rng.gen_range(0.0..100.0), y: rng.gen_range(0.0..100.0)}, i)
            };
            all.push(entry.clone());
            tree.insert(entry);
        }
        assert_eq!(tree.len(), 2000);
        for _ in 0..50 {
            let x = rng.gen_range(0.0..90.0);
            let y = rng.gen_range(0.0..90.0);
            let query = Rect::new(coord! {x: x, y: y}, coord! {x: x + 10., y: y + 10.});
            let mut expected: Vec<usize> = all
                .iter()
                .filter(|e| rects_intersect(&e.rect, &query))
                .map(|e| e.payload)
                .collect();
            let mut found: Vec<usize> = tree.query(&query).iter().map(|e| e.payload).collect();
            expected.sort();
            found.sort();
            assert_eq!(found, expected);
        }
    }

    #[test]
    fn test_points_on_split_lines_and_outside() {
        let mut tree = QuadTree::new(page()).with_node_capacity(1);
        tree.insert(SpatialEntry::point(coord! {x: 50., y: 50.}, "centre"));
        tree.insert(SpatialEntry::point(coord! {x: 25., y: 25.}, "quarter"));
        tree.insert(SpatialEntry::point(coord! {x: 150., y: -5.}, "off page"));
        tree.insert(SpatialEntry::point(coord! {x: 75., y: 75.}, "three quarter"));
        let hits = tree.query(&Rect::new(coord! {x: 49., y: 49.}, coord! {x: 51., y: 51.}));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].payload, "centre");
        let hits = tree.query(&Rect::new(coord! {x: 140., y: -10.}, coord! {x: 160., y: 0.}));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].payload, "off page");
    }

    #[test]
    fn test_any_and_distance() {
        let mut tree = QuadTree::new(page());
        assert!(tree.is_empty());
        tree.insert(SpatialEntry::rect(10., 10., 2., 2., ()));
        assert!(!tree.is_empty());
        let probe = coord! {x: 12.1, y: 11.};
        let rect = Rect::new(probe - coord! {x: 0.2, y: 0.2}, probe + coord! {x: 0.2, y: 0.2});
        assert!(tree.any(&rect, |e| e.distance_2(&probe) < 0.2 * 0.2));
        let probe = coord! {x: 12.3, y: 11.};
        let rect = Rect::new(probe - coord! {x: 0.2, y: 0.2}, probe + coord! {x: 0.2, y: 0.2});
        assert!(!tree.any(&rect, |e| e.distance_2(&probe) < 0.2 * 0.2));
        assert_eq!(tree.query(&page()).len(), 1);
    }
}
