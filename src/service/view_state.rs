use crate::models::{needs_attention, Invoice, InvoiceId};
use crate::service::sorting::{sort_invoices, SortColumn, SortDirection};
use indexmap::IndexMap;
use serde::Serialize;

/// 每页固定条数
pub const PAGE_SIZE: usize = 10;

/// 发票列表的视图状态：排序、页码、过滤、展开
///
/// 不持有发票数据；所有派生都基于调用方传入的批次，批次本身不会被修改。
#[derive(Debug, Clone, PartialEq)]
pub struct ListViewState {
    sort_column: Option<SortColumn>,
    sort_direction: Option<SortDirection>,
    current_page: usize,
    filter: Option<String>,
    expanded_rows: IndexMap<InvoiceId, bool>,
}

/// 排序状态快照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SortState {
    pub column: Option<SortColumn>,
    pub direction: Option<SortDirection>,
}

impl Default for ListViewState {
    fn default() -> Self {
        Self {
            sort_column: None,
            sort_direction: None,
            current_page: 1,
            filter: None,
            expanded_rows: IndexMap::new(),
        }
    }
}

pub fn total_pages(len: usize) -> usize {
    len.div_ceil(PAGE_SIZE)
}

impl ListViewState {
    /// 新会话：第一页并应用自动展开
    pub fn new(invoices: &[Invoice]) -> Self {
        let mut state = Self::default();
        state.auto_expand(invoices);
        state
    }

    pub fn sort_state(&self) -> SortState {
        SortState {
            column: self.sort_column,
            direction: self.sort_direction,
        }
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    /// 点击列头：同列 asc -> desc -> 无；换列从 asc 开始
    pub fn sort(&mut self, column: SortColumn, invoices: &[Invoice]) {
        if self.sort_column == Some(column) {
            self.sort_direction = match self.sort_direction {
                Some(SortDirection::Asc) => Some(SortDirection::Desc),
                Some(SortDirection::Desc) | None => None,
            };
            if self.sort_direction.is_none() {
                self.sort_column = None;
            }
        } else {
            self.sort_column = Some(column);
            self.sort_direction = Some(SortDirection::Asc);
        }
        tracing::debug!(
            "sort -> {:?} {:?}",
            self.sort_column,
            self.sort_direction
        );
        // 当前页内容变了，合并自动展开
        self.auto_expand(invoices);
    }

    /// 过滤 + 排序后的完整序列
    pub fn derive<'a>(&self, invoices: &'a [Invoice]) -> Vec<&'a Invoice> {
        let filtered: Vec<&Invoice> = match self.filter.as_deref() {
            Some(query) => invoices.iter().filter(|i| matches_filter(i, query)).collect(),
            None => invoices.iter().collect(),
        };
        sort_invoices(&filtered, self.sort_column, self.sort_direction)
    }

    /// 当前页的切片
    pub fn visible<'a>(&self, invoices: &'a [Invoice]) -> Vec<&'a Invoice> {
        let sorted = self.derive(invoices);
        let start = (self.current_page - 1).saturating_mul(PAGE_SIZE);
        if start >= sorted.len() {
            return Vec::new();
        }
        let end = (start + PAGE_SIZE).min(sorted.len());
        sorted[start..end].to_vec()
    }

    pub fn total_pages(&self, invoices: &[Invoice]) -> usize {
        total_pages(self.derive(invoices).len())
    }

    /// 翻页：页码限制在 [1, 总页数]，清空展开后重新自动展开
    pub fn go_to_page(&mut self, page: usize, invoices: &[Invoice]) {
        let last = self.total_pages(invoices).max(1);
        self.current_page = page.clamp(1, last);
        self.expanded_rows.clear();
        self.auto_expand(invoices);
        tracing::debug!("page -> {}/{}", self.current_page, last);
    }

    /// 设置过滤词（空白串视为清除），回到第一页
    pub fn set_filter(&mut self, query: Option<&str>, invoices: &[Invoice]) {
        self.filter = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);
        self.go_to_page(1, invoices);
    }

    pub fn toggle_expand(&mut self, id: &InvoiceId) {
        let flag = self.expanded_rows.entry(id.clone()).or_insert(false);
        *flag = !*flag;
    }

    pub fn is_expanded(&self, id: &InvoiceId) -> bool {
        self.expanded_rows.get(id).copied().unwrap_or(false)
    }

    /// 当前展开的行 ID
    pub fn expanded_ids(&self) -> Vec<&InvoiceId> {
        self.expanded_rows
            .iter()
            .filter(|(_, expanded)| **expanded)
            .map(|(id, _)| id)
            .collect()
    }

    /// 把当前页中被拒且带意见的行并入展开集合
    pub fn auto_expand(&mut self, invoices: &[Invoice]) {
        let flagged: Vec<InvoiceId> = self
            .visible(invoices)
            .into_iter()
            .filter(|i| needs_attention(i))
            .map(|i| i.id.clone())
            .collect();
        for id in flagged {
            self.expanded_rows.insert(id, true);
        }
    }

    /// 换入新批次：保留排序和过滤，页码收敛到新范围，丢弃已不存在的展开项
    pub fn replace_batch(&mut self, invoices: &[Invoice]) {
        self.expanded_rows
            .retain(|id, _| invoices.iter().any(|i| &i.id == id));
        let last = self.total_pages(invoices).max(1);
        self.current_page = self.current_page.clamp(1, last);
        self.auto_expand(invoices);
    }
}

fn matches_filter(invoice: &Invoice, query: &str) -> bool {
    let hit = |field: Option<&str>| field.is_some_and(|f| f.to_lowercase().contains(query));
    hit(invoice.vendor.as_deref())
        || hit(invoice.category.as_deref())
        || hit(invoice.submitted_by.as_deref())
        || invoice.id.to_string().to_lowercase().contains(query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AmountValue;
    use pretty_assertions::assert_eq;

    fn batch(n: i64) -> Vec<Invoice> {
        (1..=n)
            .map(|id| Invoice {
                vendor: Some(format!("vendor-{:02}", id)),
                amount: Some(AmountValue::Number(id as f64)),
                status: Some("for_review".into()),
                ..Invoice::new(id)
            })
            .collect()
    }

    fn declined_with_comment(invoice: &mut Invoice) {
        invoice.status = Some("declined".into());
        invoice.review_comment = Some("wrong total".into());
    }

    fn ids(invoices: &[&Invoice]) -> Vec<String> {
        invoices.iter().map(|i| i.id.to_string()).collect()
    }

    #[test]
    fn three_click_sort_cycle() {
        let invoices = batch(3);
        let mut state = ListViewState::new(&invoices);

        state.sort(SortColumn::Amount, &invoices);
        assert_eq!(
            state.sort_state(),
            SortState { column: Some(SortColumn::Amount), direction: Some(SortDirection::Asc) }
        );
        state.sort(SortColumn::Amount, &invoices);
        assert_eq!(
            state.sort_state(),
            SortState { column: Some(SortColumn::Amount), direction: Some(SortDirection::Desc) }
        );
        state.sort(SortColumn::Amount, &invoices);
        assert_eq!(state.sort_state(), SortState { column: None, direction: None });
    }

    #[test]
    fn switching_column_starts_ascending() {
        let invoices = batch(3);
        let mut state = ListViewState::new(&invoices);
        state.sort(SortColumn::Amount, &invoices);
        state.sort(SortColumn::Amount, &invoices);
        state.sort(SortColumn::Vendor, &invoices);
        assert_eq!(
            state.sort_state(),
            SortState { column: Some(SortColumn::Vendor), direction: Some(SortDirection::Asc) }
        );
    }

    #[test]
    fn pagination_of_25_records() {
        let invoices = batch(25);
        let mut state = ListViewState::new(&invoices);
        assert_eq!(state.total_pages(&invoices), 3);
        assert_eq!(state.visible(&invoices).len(), 10);

        state.go_to_page(3, &invoices);
        let page = state.visible(&invoices);
        assert_eq!(page.len(), 5);
        assert_eq!(ids(&page), vec!["21", "22", "23", "24", "25"]);
    }

    #[test]
    fn page_requests_are_clamped() {
        let invoices = batch(25);
        let mut state = ListViewState::new(&invoices);
        state.go_to_page(9, &invoices);
        assert_eq!(state.current_page(), 3);
        state.go_to_page(0, &invoices);
        assert_eq!(state.current_page(), 1);

        let empty: Vec<Invoice> = Vec::new();
        let mut state = ListViewState::new(&empty);
        state.go_to_page(2, &empty);
        assert_eq!(state.current_page(), 1);
        assert!(state.visible(&empty).is_empty());
    }

    #[test]
    fn sorted_pages_follow_sort_order() {
        let invoices = batch(25);
        let mut state = ListViewState::new(&invoices);
        state.sort(SortColumn::Amount, &invoices);
        state.sort(SortColumn::Amount, &invoices);
        assert_eq!(ids(&state.visible(&invoices))[0], "25");
    }

    #[test]
    fn toggle_expand_defaults_to_false() {
        let invoices = batch(2);
        let mut state = ListViewState::new(&invoices);
        let id = InvoiceId::Number(2);
        assert!(!state.is_expanded(&id));
        state.toggle_expand(&id);
        assert!(state.is_expanded(&id));
        state.toggle_expand(&id);
        assert!(!state.is_expanded(&id));
    }

    #[test]
    fn first_page_auto_expands_declined_with_comment() {
        let mut invoices = batch(12);
        declined_with_comment(&mut invoices[1]);
        invoices[2].status = Some("declined".into());

        let state = ListViewState::new(&invoices);
        assert!(state.is_expanded(&InvoiceId::Number(2)));
        assert!(!state.is_expanded(&InvoiceId::Number(3)));
    }

    #[test]
    fn whitespace_comment_still_auto_expands() {
        let mut invoices = batch(3);
        invoices[0].status = Some("declined".into());
        invoices[0].review_comment = Some("  ".into());
        invoices[1].status = Some("declined".into());
        invoices[1].review_comment = Some(String::new());

        let state = ListViewState::new(&invoices);
        assert!(state.is_expanded(&InvoiceId::Number(1)));
        assert!(!state.is_expanded(&InvoiceId::Number(2)));
    }

    #[test]
    fn page_change_clears_manual_expansion_then_auto_expands() {
        let mut invoices = batch(25);
        declined_with_comment(&mut invoices[13]);

        let mut state = ListViewState::new(&invoices);
        state.toggle_expand(&InvoiceId::Number(1));
        assert!(state.is_expanded(&InvoiceId::Number(1)));

        state.go_to_page(2, &invoices);
        assert!(!state.is_expanded(&InvoiceId::Number(1)));
        assert!(state.is_expanded(&InvoiceId::Number(14)));
        assert_eq!(state.expanded_ids(), vec![&InvoiceId::Number(14)]);
    }

    #[test]
    fn auto_expansion_merges_with_manual_expansion() {
        let mut invoices = batch(12);
        declined_with_comment(&mut invoices[11]);

        let mut state = ListViewState::new(&invoices);
        state.toggle_expand(&InvoiceId::Number(3));
        // 降序后 id 12 来到第一页
        state.sort(SortColumn::Amount, &invoices);
        state.sort(SortColumn::Amount, &invoices);

        assert!(state.is_expanded(&InvoiceId::Number(3)));
        assert!(state.is_expanded(&InvoiceId::Number(12)));
    }

    #[test]
    fn filter_resets_to_first_page() {
        let mut invoices = batch(25);
        invoices[20].category = Some("Travel".into());
        let mut state = ListViewState::new(&invoices);
        state.go_to_page(3, &invoices);

        state.set_filter(Some("travel"), &invoices);
        assert_eq!(state.current_page(), 1);
        assert_eq!(ids(&state.visible(&invoices)), vec!["21"]);

        state.set_filter(Some("   "), &invoices);
        assert_eq!(state.filter(), None);
        assert_eq!(state.total_pages(&invoices), 3);
    }

    #[test]
    fn replace_batch_clamps_page_and_prunes_expansion() {
        let invoices = batch(25);
        let mut state = ListViewState::new(&invoices);
        state.go_to_page(3, &invoices);
        state.toggle_expand(&InvoiceId::Number(22));

        let shorter = batch(12);
        state.replace_batch(&shorter);
        assert_eq!(state.current_page(), 2);
        assert!(state.expanded_ids().is_empty());
    }

    #[test]
    fn derive_does_not_mutate_input() {
        let invoices = batch(5);
        let before = invoices.clone();
        let mut state = ListViewState::new(&invoices);
        state.sort(SortColumn::Amount, &invoices);
        state.sort(SortColumn::Amount, &invoices);
        let _ = state.derive(&invoices);
        assert_eq!(invoices, before);
    }
}
