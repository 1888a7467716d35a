//! 多模式匹配自动机（Aho-Corasick）
//!
//! 状态存放在数组中，以下标互相引用：
//! - `goto`：字典树边
//! - `fail`：失配链接，指向当前路径在树中存在的最长真后缀
//! - `outputs`：沿失配链合并后的输出集合
//!
//! 符号类型是泛型参数：原文自动机以字符为符号，拼音自动机以整个音节为符号，
//! 因此失配跳转总是跳过完整音节。

use std::collections::{BTreeMap, VecDeque};

use crate::trigger::error::{TriggerError, TriggerResult};

pub type StateId = usize;

/// 起始状态
pub const ROOT: StateId = 0;

/// 输出项：触发词下标 + 符号长度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Output {
    pub pattern: usize,
    pub len: usize,
}

#[derive(Debug, Clone)]
struct State<S> {
    goto: BTreeMap<S, StateId>,
    fail: StateId,
    depth: usize,
    outputs: Vec<Output>,
}

impl<S> State<S> {
    fn new(depth: usize) -> Self {
        Self {
            goto: BTreeMap::new(),
            fail: ROOT,
            depth,
            outputs: Vec::new(),
        }
    }
}

/// 自动机构建器
#[derive(Debug, Clone)]
pub struct AutomatonBuilder<S> {
    states: Vec<State<S>>,
    patterns: usize,
}

impl<S: Ord + Clone> AutomatonBuilder<S> {
    pub fn new() -> Self {
        Self {
            states: vec![State::new(0)],
            patterns: 0,
        }
    }

    /// 插入一个模式
    ///
    /// 空模式不插入，返回 false
    pub fn insert(&mut self, symbols: &[S], pattern: usize) -> bool {
        if symbols.is_empty() {
            return false;
        }

        let mut current = ROOT;
        for symbol in symbols {
            current = match self.states[current].goto.get(symbol) {
                Some(&next) => next,
                None => {
                    let next = self.states.len();
                    let depth = self.states[current].depth + 1;
                    self.states.push(State::new(depth));
                    self.states[current].goto.insert(symbol.clone(), next);
                    next
                }
            };
        }

        self.states[current].outputs.push(Output {
            pattern,
            len: symbols.len(),
        });
        self.patterns += 1;
        true
    }

    /// 按层序计算失配链接并合并输出
    pub fn build(mut self) -> Automaton<S> {
        let mut queue: VecDeque<StateId> = VecDeque::new();

        // 第一层的失配链接都指向起始状态
        let first_level: Vec<StateId> = self.states[ROOT].goto.values().copied().collect();
        for state in first_level {
            self.states[state].fail = ROOT;
            queue.push_back(state);
        }

        while let Some(parent) = queue.pop_front() {
            let children: Vec<(S, StateId)> = self.states[parent]
                .goto
                .iter()
                .map(|(symbol, &child)| (symbol.clone(), child))
                .collect();

            for (symbol, child) in children {
                // 沿父状态的失配链寻找可接受该符号的最长后缀
                let mut fallback = self.states[parent].fail;
                let fail = loop {
                    if let Some(&target) = self.states[fallback].goto.get(&symbol) {
                        break target;
                    }
                    if fallback == ROOT {
                        break ROOT;
                    }
                    fallback = self.states[fallback].fail;
                };

                self.states[child].fail = fail;

                // 失配目标深度更小，其输出已在更早的层完成合并
                let inherited = self.states[fail].outputs.clone();
                let outputs = &mut self.states[child].outputs;
                outputs.extend(inherited);
                outputs.sort_unstable();
                outputs.dedup();

                queue.push_back(child);
            }
        }

        self.states[ROOT].outputs.sort_unstable();

        Automaton {
            states: self.states,
            patterns: self.patterns,
        }
    }
}

impl<S: Ord + Clone> Default for AutomatonBuilder<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// 编译后的自动机（只读）
#[derive(Debug, Clone)]
pub struct Automaton<S> {
    states: Vec<State<S>>,
    patterns: usize,
}

impl<S: Ord + Clone> Automaton<S> {
    /// 只含起始状态的空自动机
    pub fn empty() -> Self {
        AutomatonBuilder::new().build()
    }

    /// 状态数
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// 是否没有任何模式
    pub fn is_empty(&self) -> bool {
        self.patterns == 0
    }

    /// 已插入的模式数
    pub fn pattern_count(&self) -> usize {
        self.patterns
    }

    /// 转移函数（已解析失配链接）
    ///
    /// 对任意状态和任意符号都有定义，最差回到起始状态
    pub fn next(&self, state: StateId, symbol: &S) -> StateId {
        let mut current = state;
        loop {
            if let Some(&target) = self.states[current].goto.get(symbol) {
                return target;
            }
            if current == ROOT {
                return ROOT;
            }
            current = self.states[current].fail;
        }
    }

    /// 状态的合并输出集合
    pub fn outputs(&self, state: StateId) -> &[Output] {
        &self.states[state].outputs
    }

    pub fn fail(&self, state: StateId) -> StateId {
        self.states[state].fail
    }

    pub fn depth(&self, state: StateId) -> usize {
        self.states[state].depth
    }

    /// 校验结构不变量
    ///
    /// - 起始状态深度为 0，失配链接指向自身
    /// - 其余状态的失配目标深度严格更小（失配链构成以起始状态为根的无环图）
    /// - 字典树边深度加一
    /// - 输出长度在 [1, depth] 内且已排序
    pub fn validate(&self) -> TriggerResult<()> {
        let invariant = |msg: String| Err(TriggerError::Invariant(msg));
        let count = self.states.len();

        let Some(root) = self.states.first() else {
            return invariant("自动机缺少起始状态".to_string());
        };
        if root.depth != 0 || root.fail != ROOT {
            return invariant("起始状态的深度或失配链接异常".to_string());
        }
        if !root.outputs.is_empty() {
            return invariant("起始状态不应有输出".to_string());
        }

        for (id, state) in self.states.iter().enumerate() {
            if state.fail >= count {
                return invariant(format!("状态 {} 的失配链接越界", id));
            }
            if id != ROOT && self.states[state.fail].depth >= state.depth {
                return invariant(format!("状态 {} 的失配链接未指向更短的后缀", id));
            }
            for &child in state.goto.values() {
                if child >= count || self.states[child].depth != state.depth + 1 {
                    return invariant(format!("状态 {} 的转移目标异常", id));
                }
            }
            if state
                .outputs
                .iter()
                .any(|o| o.len == 0 || o.len > state.depth)
            {
                return invariant(format!("状态 {} 的输出长度超出路径深度", id));
            }
            if state.outputs.windows(2).any(|w| w[0] >= w[1]) {
                return invariant(format!("状态 {} 的输出未排序或有重复", id));
            }
        }

        Ok(())
    }
}

impl<S: Ord + Clone> Default for Automaton<S> {
    fn default() -> Self {
        Self::empty()
    }
}
