//! 触发词匹配
//!
//! 1. 原文自动机逐字符扫描
//! 2. 拼音自动机扫描候选读音序列：同一位置可能有多个读音，
//!    因此维护一组活跃状态而非单一状态，每步用每个候选推进每个状态
//! 3. 合并、去重（同一触发词区间重叠时只保留一个，精确优先）并排序

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap};

use crate::trigger::automaton::{StateId, ROOT};
use crate::trigger::compiler::CompiledTriggers;
use crate::trigger::error::{TriggerError, TriggerResult};
use crate::trigger::phonetic::NormalizedSegment;
use crate::trigger::tokenizer::{fold_case, fold_width};
use crate::trigger::types::{MatchEvent, MatchKind, MatchSet, Pattern};

/// 触发词匹配器（无状态，每个片段独立）
pub struct TriggerMatcher<'a> {
    triggers: &'a CompiledTriggers,
}

impl<'a> TriggerMatcher<'a> {
    pub fn new(triggers: &'a CompiledTriggers) -> Self {
        Self { triggers }
    }

    /// 扫描单个文本片段
    ///
    /// # Arguments
    /// * `text` - 文本片段
    /// * `case_override` - 覆盖所有触发词的大小写敏感设置
    ///
    /// 无匹配返回空结果；错误只可能是自动机内部不变量被破坏
    pub fn scan(&self, text: &str, case_override: Option<bool>) -> TriggerResult<MatchSet> {
        if text.is_empty() {
            return Ok(MatchSet::empty());
        }

        let chars: Vec<char> = text.chars().collect();
        let mut events = self.scan_exact(&chars, case_override)?;
        let mut gaps = 0;

        if !self.triggers.phonetic().is_empty() {
            let segment = self.triggers.normalizer().normalize(text);
            gaps = segment.gaps();
            events.extend(self.scan_phonetic(&chars, &segment)?);
        }

        let mut set = merge(events);
        set.gaps = gaps;
        Ok(set)
    }

    /// 原文扫描
    fn scan_exact(&self, chars: &[char], case_override: Option<bool>) -> TriggerResult<Vec<MatchEvent>> {
        let automaton = self.triggers.exact();
        let mut events = Vec::new();
        if automaton.is_empty() {
            return Ok(events);
        }

        let folded: Vec<char> = chars.iter().map(|&ch| fold_width(ch)).collect();
        let mut state = ROOT;

        for (pos, &ch) in folded.iter().enumerate() {
            state = automaton.next(state, &fold_case(ch));
            let end = pos + 1;

            for output in automaton.outputs(state) {
                let start = end
                    .checked_sub(output.len)
                    .ok_or_else(|| invariant(format!("原文输出长度 {} 超出已读位置 {}", output.len, end)))?;
                let pattern = self.pattern(output.pattern)?;

                // 区分大小写时用宽度归一化后的原文复核
                if case_override.unwrap_or(pattern.case_sensitive) {
                    let Some(raw) = &pattern.raw else {
                        return Err(invariant(format!("触发词 {} 没有原文却出现在原文自动机中", pattern.id)));
                    };
                    if folded[start..end] != raw[..] {
                        continue;
                    }
                }

                events.push(MatchEvent {
                    pattern_id: pattern.id.clone(),
                    kind: MatchKind::Exact,
                    start,
                    end,
                    text: chars[start..end].iter().collect(),
                    syllables: Vec::new(),
                    weight: pattern.weight,
                });
            }
        }

        Ok(events)
    }

    /// 拼音扫描（多分支并行推进）
    fn scan_phonetic(&self, chars: &[char], segment: &NormalizedSegment) -> TriggerResult<Vec<MatchEvent>> {
        let automaton = self.triggers.phonetic();
        let positions = segment.positions();
        if positions.len() != chars.len() {
            return Err(invariant(format!(
                "规范化结果位置数 {} 与字符数 {} 不一致",
                positions.len(),
                chars.len()
            )));
        }

        let mut active: Vec<StateId> = vec![ROOT];
        let mut next: Vec<StateId> = Vec::new();
        let mut marked = vec![false; automaton.len()];
        // (起始位置, 结束位置, 触发词下标)
        let mut found: BTreeSet<(usize, usize, usize)> = BTreeSet::new();

        for (pos, reading) in positions.iter().enumerate() {
            if reading.candidates.is_empty() {
                return Err(invariant(format!("位置 {} 没有候选读音", pos)));
            }

            next.clear();
            for &state in &active {
                for token in &reading.candidates {
                    let target = automaton.next(state, token);
                    if !marked[target] {
                        marked[target] = true;
                        next.push(target);
                    }
                }
            }
            next.sort_unstable();

            let end = pos + 1;
            for &state in &next {
                marked[state] = false;
                for output in automaton.outputs(state) {
                    let first = end
                        .checked_sub(output.len)
                        .ok_or_else(|| invariant(format!("拼音输出长度 {} 超出已读位置 {}", output.len, end)))?;
                    found.insert((first, end, output.pattern));
                }
            }

            std::mem::swap(&mut active, &mut next);
        }

        let mut events = Vec::with_capacity(found.len());
        for (first, last, idx) in found {
            let (start, end) = segment
                .source_span(first, last)
                .filter(|&(start, end)| start < end && end <= chars.len())
                .ok_or_else(|| invariant(format!("拼音区间 [{}, {}) 无法映射回原文", first, last)))?;
            let pattern = self.pattern(idx)?;

            events.push(MatchEvent {
                pattern_id: pattern.id.clone(),
                kind: MatchKind::Phonetic,
                start,
                end,
                text: chars[start..end].iter().collect(),
                syllables: pattern
                    .phonetic
                    .iter()
                    .flatten()
                    .map(|token| token.to_string())
                    .collect(),
                weight: pattern.weight,
            });
        }

        Ok(events)
    }

    fn pattern(&self, idx: usize) -> TriggerResult<&'a Pattern> {
        self.triggers
            .pattern(idx)
            .ok_or_else(|| invariant(format!("输出引用了不存在的触发词 {}", idx)))
    }
}

fn invariant(msg: String) -> TriggerError {
    TriggerError::Invariant(msg)
}

/// 合并原文与拼音事件
///
/// 同一触发词区间重叠视为重复：精确优先，其次位置靠前者优先
fn merge(mut events: Vec<MatchEvent>) -> MatchSet {
    events.sort_by(|a, b| {
        a.kind
            .cmp(&b.kind)
            .then(a.start.cmp(&b.start))
            .then(a.end.cmp(&b.end))
            .then_with(|| a.pattern_id.cmp(&b.pattern_id))
    });

    // 每个触发词已保留事件在 kept 中的下标
    let mut taken: HashMap<String, Vec<usize>> = HashMap::new();
    let mut kept: Vec<MatchEvent> = Vec::with_capacity(events.len());

    for event in events {
        let indices = taken.entry(event.pattern_id.clone()).or_default();
        if indices.iter().any(|&i| kept[i].overlaps(&event)) {
            continue;
        }
        indices.push(kept.len());
        kept.push(event);
    }

    kept.sort_by(rank);
    MatchSet {
        events: kept,
        gaps: 0,
    }
}

/// 排序：起始位置升序、权重降序、标识升序
fn rank(a: &MatchEvent, b: &MatchEvent) -> Ordering {
    a.start
        .cmp(&b.start)
        .then_with(|| b.weight.total_cmp(&a.weight))
        .then_with(|| a.pattern_id.cmp(&b.pattern_id))
        .then_with(|| a.end.cmp(&b.end))
        .then_with(|| a.kind.cmp(&b.kind))
}
