//! Клиентская сортировка, фильтрация и пагинация уже загруженных объявлений.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::models::Post;

/// Размер страницы на главной.
pub const MAIN_PAGE_SIZE: usize = 6;
/// Размер страницы в каталоге объявлений.
pub const NOTICES_PAGE_SIZE: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
/// Вкладка сортировки над списком объявлений.
pub enum SortTab {
    /// Исходный порядок.
    #[default]
    All,
    /// По убыванию просмотров.
    Popular,
    /// Сначала новые.
    New,
    /// По возрастанию цены.
    Cheapest,
    /// По убыванию цены.
    Expensive,
}

impl SortTab {
    /// Все вкладки в порядке отображения.
    pub const ALL: [SortTab; 5] = [
        Self::All,
        Self::Popular,
        Self::New,
        Self::Cheapest,
        Self::Expensive,
    ];

    /// Подпись вкладки.
    pub fn label(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Popular => "Popular",
            Self::New => "New",
            Self::Cheapest => "Cheapest",
            Self::Expensive => "Expensive",
        }
    }
}

impl fmt::Display for SortTab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown sort tab: {0}")]
/// Подпись, не соответствующая ни одной вкладке.
pub struct UnknownSortTab(pub String);

impl FromStr for SortTab {
    type Err = UnknownSortTab;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|tab| tab.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownSortTab(wanted.to_string()))
    }
}

/// Отсутствующие значения всегда уходят в конец.
fn missing_last<T>(a: Option<T>, b: Option<T>, cmp: impl FnOnce(T, T) -> Ordering) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => cmp(a, b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Возвращает переупорядоченную копию списка для выбранной вкладки.
pub fn sort_posts(posts: &[Post], tab: SortTab) -> Vec<Post> {
    let mut sorted = posts.to_vec();
    match tab {
        SortTab::All => {}
        SortTab::Popular => {
            sorted.sort_by(|a, b| b.views.unwrap_or(0).cmp(&a.views.unwrap_or(0)));
        }
        SortTab::New => {
            sorted.sort_by(|a, b| missing_last(a.created_at, b.created_at, |a, b| b.cmp(&a)));
        }
        SortTab::Cheapest => {
            sorted.sort_by(|a, b| missing_last(a.price, b.price, |a, b| a.total_cmp(&b)));
        }
        SortTab::Expensive => {
            sorted.sort_by(|a, b| missing_last(a.price, b.price, |a, b| b.total_cmp(&a)));
        }
    }
    sorted
}

#[derive(Debug, Clone, Default, PartialEq)]
/// Локальный фильтр над загруженными объявлениями.
pub struct ListingFilter {
    /// Подстрока в заголовке, описании или тегах (без учёта регистра).
    pub query: Option<String>,
    /// Категория.
    pub category_id: Option<i64>,
    /// Минимальная цена включительно.
    pub min_price: Option<f64>,
    /// Максимальная цена включительно.
    pub max_price: Option<f64>,
    /// Показывать закрытые объявления.
    pub include_closed: bool,
}

impl ListingFilter {
    /// Проходит ли объявление фильтр.
    pub fn matches(&self, post: &Post) -> bool {
        if post.is_closed && !self.include_closed {
            return false;
        }

        if let Some(category_id) = self.category_id
            && post.category_id() != Some(category_id)
        {
            return false;
        }

        if self.min_price.is_some() || self.max_price.is_some() {
            let Some(price) = post.price else {
                return false;
            };
            if self.min_price.is_some_and(|min| price < min) {
                return false;
            }
            if self.max_price.is_some_and(|max| price > max) {
                return false;
            }
        }

        match self.query.as_deref().map(str::trim) {
            Some(query) if !query.is_empty() => {
                let query = query.to_lowercase();
                post.title.to_lowercase().contains(&query)
                    || post
                        .caption
                        .as_deref()
                        .is_some_and(|caption| caption.to_lowercase().contains(&query))
                    || post
                        .tags
                        .iter()
                        .any(|tag| tag.to_lowercase().contains(&query))
            }
            _ => true,
        }
    }
}

/// Оставляет объявления, прошедшие фильтр, в исходном порядке.
pub fn filter_posts(posts: &[Post], filter: &ListingFilter) -> Vec<Post> {
    posts
        .iter()
        .filter(|post| filter.matches(post))
        .cloned()
        .collect()
}

/// Количество страниц: `ceil(total_items / page_size)`.
pub fn page_count(total_items: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 0;
    }
    total_items.div_ceil(page_size)
}

/// Элементы страницы с номером `page` (с единицы). Вне диапазона пусто.
pub fn page_slice<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Элемент переключателя страниц.
pub enum PageItem {
    /// Кнопка с номером страницы.
    Page {
        /// Номер страницы.
        number: usize,
        /// Текущая ли это страница.
        current: bool,
    },
    /// Пропуск между кнопками.
    Ellipsis,
}

/// Строит переключатель страниц.
///
/// Первая и последняя страницы показываются всегда, вокруг текущей не
/// больше одного соседа с каждой стороны. Многоточие появляется, только если
/// текущая страница дальше чем на 2 от края. `total_pages == 0` трактуется как
/// одна страница, чтобы кнопка "1" была всегда.
pub fn page_items(current: usize, total_pages: usize) -> Vec<PageItem> {
    let total = total_pages.max(1);
    let current = current.clamp(1, total);
    let page = |number: usize| PageItem::Page {
        number,
        current: number == current,
    };

    let mut items = vec![page(1)];
    if current - 1 > 2 {
        items.push(PageItem::Ellipsis);
    }

    let start = current.saturating_sub(1).max(2);
    let end = (current + 1).min(total - 1);
    for number in start..=end {
        items.push(page(number));
    }

    if total - current > 2 {
        items.push(PageItem::Ellipsis);
    }
    if total > 1 {
        items.push(page(total));
    }
    items
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Состояние пагинации списка фиксированного размера.
pub struct Paginator {
    page_size: usize,
    total_items: usize,
    current: usize,
}

impl Paginator {
    /// Пагинатор на первой странице.
    pub fn new(total_items: usize, page_size: usize) -> Self {
        Self {
            page_size,
            total_items,
            current: 1,
        }
    }

    /// Размер страницы.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Текущая страница (с единицы).
    pub fn current(&self) -> usize {
        self.current
    }

    /// Общее число страниц.
    pub fn total_pages(&self) -> usize {
        page_count(self.total_items, self.page_size)
    }

    /// Меняет длину списка (например, после смены вкладки или фильтра)
    /// и возвращает на первую страницу.
    pub fn reset(&mut self, total_items: usize) {
        self.total_items = total_items;
        self.current = 1;
    }

    /// Переходит на страницу, ограничивая номер допустимым диапазоном.
    pub fn set_page(&mut self, page: usize) {
        self.current = page.clamp(1, self.total_pages().max(1));
    }

    /// Есть ли следующая страница.
    pub fn has_next(&self) -> bool {
        self.current < self.total_pages()
    }

    /// Есть ли предыдущая страница.
    pub fn has_prev(&self) -> bool {
        self.current > 1
    }

    /// Следующая страница.
    pub fn next(&mut self) {
        self.set_page(self.current + 1);
    }

    /// Предыдущая страница.
    pub fn prev(&mut self) {
        self.set_page(self.current.saturating_sub(1));
    }

    /// Элементы текущей страницы.
    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        page_slice(items, self.current, self.page_size)
    }

    /// Переключатель страниц для текущего состояния.
    pub fn items(&self) -> Vec<PageItem> {
        page_items(self.current, self.total_pages())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn post(id: i64, price: Option<f64>, views: Option<u64>, created_ts: Option<i64>) -> Post {
        Post {
            id,
            title: format!("post {id}"),
            price,
            views,
            created_at: created_ts.map(|ts| Utc.timestamp_opt(ts, 0).single().expect("valid ts")),
            ..Default::default()
        }
    }

    fn ids(posts: &[Post]) -> Vec<i64> {
        posts.iter().map(|post| post.id).collect()
    }

    fn sample() -> Vec<Post> {
        vec![
            post(1, Some(10.0), Some(5), Some(100)),
            post(2, Some(5.0), Some(50), Some(300)),
            post(3, Some(20.0), Some(1), Some(200)),
        ]
    }

    fn numbers(items: &[PageItem]) -> Vec<String> {
        items
            .iter()
            .map(|item| match item {
                PageItem::Page { number, .. } => number.to_string(),
                PageItem::Ellipsis => "...".to_string(),
            })
            .collect()
    }

    #[test]
    fn cheapest_sorts_prices_ascending() {
        let sorted = sort_posts(&sample(), SortTab::Cheapest);
        let prices: Vec<f64> = sorted.iter().filter_map(|p| p.price).collect();
        assert_eq!(prices, vec![5.0, 10.0, 20.0]);
    }

    #[test]
    fn every_tab_yields_expected_order() {
        let posts = sample();
        assert_eq!(ids(&sort_posts(&posts, SortTab::All)), vec![1, 2, 3]);
        assert_eq!(ids(&sort_posts(&posts, SortTab::Popular)), vec![2, 1, 3]);
        assert_eq!(ids(&sort_posts(&posts, SortTab::New)), vec![2, 3, 1]);
        assert_eq!(ids(&sort_posts(&posts, SortTab::Cheapest)), vec![2, 1, 3]);
        assert_eq!(ids(&sort_posts(&posts, SortTab::Expensive)), vec![3, 1, 2]);
    }

    #[test]
    fn sorting_leaves_input_untouched() {
        let posts = sample();
        let _ = sort_posts(&posts, SortTab::Expensive);
        assert_eq!(ids(&posts), vec![1, 2, 3]);
    }

    #[test]
    fn missing_values_sort_last() {
        let posts = vec![
            post(1, None, None, None),
            post(2, Some(3.0), Some(1), Some(10)),
        ];
        assert_eq!(ids(&sort_posts(&posts, SortTab::Cheapest)), vec![2, 1]);
        assert_eq!(ids(&sort_posts(&posts, SortTab::Expensive)), vec![2, 1]);
        assert_eq!(ids(&sort_posts(&posts, SortTab::New)), vec![2, 1]);
        assert_eq!(ids(&sort_posts(&posts, SortTab::Popular)), vec![2, 1]);
    }

    #[test]
    fn sort_tab_parses_labels_case_insensitively() {
        assert_eq!("popular".parse::<SortTab>(), Ok(SortTab::Popular));
        assert_eq!(" Expensive ".parse::<SortTab>(), Ok(SortTab::Expensive));
        assert!("Oldest".parse::<SortTab>().is_err());
        for tab in SortTab::ALL {
            assert_eq!(tab.to_string().parse::<SortTab>(), Ok(tab));
        }
    }

    #[test]
    fn filter_matches_query_category_and_price() {
        let mut bike = post(1, Some(100.0), None, None);
        bike.title = "Mountain Bike".to_string();
        bike.category = Some(crate::models::CategoryRef::Id(2));
        let mut lamp = post(2, Some(15.0), None, None);
        lamp.caption = Some("desk lamp".to_string());
        lamp.tags = vec!["home".to_string()];
        let mut closed = post(3, Some(50.0), None, None);
        closed.is_closed = true;
        let posts = vec![bike, lamp, closed];

        let by_query = ListingFilter {
            query: Some("BIKE".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&filter_posts(&posts, &by_query)), vec![1]);

        let by_tag = ListingFilter {
            query: Some("home".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&filter_posts(&posts, &by_tag)), vec![2]);

        let by_category = ListingFilter {
            category_id: Some(2),
            ..Default::default()
        };
        assert_eq!(ids(&filter_posts(&posts, &by_category)), vec![1]);

        let by_price = ListingFilter {
            min_price: Some(10.0),
            max_price: Some(60.0),
            include_closed: true,
            ..Default::default()
        };
        assert_eq!(ids(&filter_posts(&posts, &by_price)), vec![2, 3]);
    }

    #[test]
    fn page_count_is_ceiling() {
        assert_eq!(page_count(0, 6), 0);
        assert_eq!(page_count(6, 6), 1);
        assert_eq!(page_count(7, 6), 2);
        assert_eq!(page_count(25, 10), 3);
        assert_eq!(page_count(5, 0), 0);
    }

    #[test]
    fn page_slice_returns_requested_window() {
        let items: Vec<u32> = (1..=13).collect();
        assert_eq!(page_slice(&items, 1, 6), &[1, 2, 3, 4, 5, 6]);
        assert_eq!(page_slice(&items, 3, 6), &[13]);
        assert!(page_slice(&items, 4, 6).is_empty());
        assert!(page_slice(&items, 0, 6).is_empty());
    }

    #[test]
    fn page_items_always_show_first_and_last() {
        for total in 1..=12 {
            for current in 1..=total {
                let items = page_items(current, total);
                assert_eq!(
                    items.first(),
                    Some(&PageItem::Page {
                        number: 1,
                        current: current == 1
                    })
                );
                assert_eq!(
                    items.last(),
                    Some(&PageItem::Page {
                        number: total,
                        current: current == total
                    })
                );
            }
        }
    }

    #[test]
    fn ellipsis_appears_only_far_from_edges() {
        for total in 1..=12usize {
            for current in 1..=total {
                let items = page_items(current, total);
                let ellipses = items
                    .iter()
                    .filter(|item| **item == PageItem::Ellipsis)
                    .count();
                let expected =
                    usize::from(current - 1 > 2) + usize::from(total - current > 2);
                assert_eq!(ellipses, expected, "current={current} total={total}");
            }
        }
    }

    #[test]
    fn page_items_layouts() {
        assert_eq!(numbers(&page_items(1, 1)), vec!["1"]);
        assert_eq!(numbers(&page_items(1, 0)), vec!["1"]);
        assert_eq!(numbers(&page_items(1, 2)), vec!["1", "2"]);
        assert_eq!(numbers(&page_items(3, 5)), vec!["1", "2", "3", "4", "5"]);
        assert_eq!(numbers(&page_items(1, 10)), vec!["1", "2", "...", "10"]);
        assert_eq!(
            numbers(&page_items(5, 10)),
            vec!["1", "...", "4", "5", "6", "...", "10"]
        );
        assert_eq!(numbers(&page_items(10, 10)), vec!["1", "...", "9", "10"]);
    }

    #[test]
    fn paginator_clamps_and_slices() {
        let items: Vec<u32> = (1..=25).collect();
        let mut pager = Paginator::new(items.len(), NOTICES_PAGE_SIZE);
        assert_eq!(pager.total_pages(), 3);
        assert!(!pager.has_prev());

        pager.next();
        pager.next();
        pager.next();
        assert_eq!(pager.current(), 3);
        assert!(!pager.has_next());
        assert_eq!(pager.slice(&items), &[21, 22, 23, 24, 25]);

        pager.prev();
        assert_eq!(pager.current(), 2);
        assert_eq!(pager.slice(&items), &[11, 12, 13, 14, 15, 16, 17, 18, 19, 20]);
        pager.prev();
        assert_eq!(pager.current(), 1);
        pager.prev();
        assert_eq!(pager.current(), 1);
        assert!(!pager.has_prev());

        pager.set_page(0);
        assert_eq!(pager.current(), 1);

        pager.set_page(2);
        pager.reset(4);
        assert_eq!(pager.current(), 1);
        assert_eq!(pager.total_pages(), 1);
        assert_eq!(numbers(&pager.items()), vec!["1"]);
    }
}
