//! Post collection ordered by date

use indexmap::IndexMap;

use super::Post;

/// All posts of a site, kept in load order
#[derive(Debug, Clone, Default)]
pub struct PostCollection {
    posts: Vec<Post>,
    /// Indices into `posts`, newest first; ties keep load order
    order: Vec<usize>,
}

impl PostCollection {
    pub fn new(posts: Vec<Post>) -> Self {
        let mut collection = Self {
            posts,
            order: Vec::new(),
        };
        collection.reorder();
        collection
    }

    pub fn push(&mut self, post: Post) {
        self.posts.push(post);
        self.reorder();
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Posts from newest to oldest
    pub fn by_date(&self) -> impl Iterator<Item = &Post> + '_ {
        self.order.iter().map(move |&i| &self.posts[i])
    }

    /// Posts grouped by category, each group newest first
    pub fn categories(&self) -> IndexMap<String, Vec<&Post>> {
        let mut groups: IndexMap<String, Vec<&Post>> = IndexMap::new();
        for post in self.by_date() {
            for category in &post.categories {
                groups.entry(category.clone()).or_default().push(post);
            }
        }
        groups
    }

    /// Returns (newer, older) neighbours of a post in date order
    pub fn neighbors(&self, post: &Post) -> (Option<&Post>, Option<&Post>) {
        let Some(pos) = self
            .order
            .iter()
            .position(|&i| std::ptr::eq(&self.posts[i], post))
        else {
            return (None, None);
        };

        let newer = pos
            .checked_sub(1)
            .map(|p| &self.posts[self.order[p]]);
        let older = self.order.get(pos + 1).map(|&i| &self.posts[i]);
        (newer, older)
    }

    /// Posts from newest to oldest, each with its (newer, older) neighbours
    pub fn by_date_with_neighbors(
        &self,
    ) -> impl Iterator<Item = (Option<&Post>, &Post, Option<&Post>)> + '_ {
        let at = move |rank: usize| self.order.get(rank).map(|&i| &self.posts[i]);
        (0..self.order.len()).map(move |rank| {
            let newer = rank.checked_sub(1).and_then(at);
            (newer, &self.posts[self.order[rank]], at(rank + 1))
        })
    }

    /// Consume the collection, returning posts newest first
    pub fn into_vec(self) -> Vec<Post> {
        let mut slots: Vec<Option<Post>> = self.posts.into_iter().map(Some).collect();
        self.order
            .iter()
            .filter_map(|&i| slots[i].take())
            .collect()
    }

    fn reorder(&mut self) {
        let mut order: Vec<usize> = (0..self.posts.len()).collect();
        // sort_by is stable, so equal dates stay in load order
        order.sort_by(|&a, &b| self.posts[b].date.cmp(&self.posts[a].date));
        self.order = order;
    }
}

impl FromIterator<Post> for PostCollection {
    fn from_iter<I: IntoIterator<Item = Post>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
