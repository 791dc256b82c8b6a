use crate::lane_marker::FlagMarker;
use crate::sieve_math::count_odd_in;

/// 値 `start + i` を添字 `i` で表すフラグバッファと、1 のままのフラグ数（候補数）。
///
/// 候補数は書き込みのたびに 1→0 の遷移だけを数えて更新するため、
/// 最後に全体を数え直さなくても `into_primes` の確保サイズとして使える。
/// 篩 1 回分の作業領域で、他のタスクと共有しない。
#[derive(Debug)]
pub struct FlagBuffer {
    start: u64,
    flags: Vec<u8>,
    candidates: u64,
}

impl FlagBuffer {
    /// `[start, start + len)` のバッファを確保し、2 と 3 の倍数を消した状態で返す。
    ///
    /// 0 と 1 は合成数扱い、2 と 3 は素数扱いに補正する（範囲内にある場合のみ）。
    pub fn new(start: u64, len: usize, marker: &dyn FlagMarker) -> Self {
        let mut flags = vec![0u8; len];
        let multiples_of_3 = marker.mark(&mut flags, start);
        let candidates = count_odd_in(start, len as u64) - multiples_of_3;

        let mut buffer = Self {
            start,
            flags,
            candidates,
        };
        buffer.strike_value(0);
        buffer.strike_value(1);
        buffer.reinstate_value(2);
        buffer.reinstate_value(3);
        buffer
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// 追跡している候補数（1 のフラグの数）。
    pub fn candidates(&self) -> u64 {
        self.candidates
    }

    /// フラグを数え直す。候補数の整合性確認用。
    pub fn recount(&self) -> u64 {
        self.flags.iter().filter(|&&f| f == 1).count() as u64
    }

    pub fn is_candidate(&self, index: usize) -> bool {
        self.flags[index] == 1
    }

    /// 添字 `index` を合成数にする。すでに 0 なら何もしない。
    #[inline]
    pub fn strike(&mut self, index: usize) {
        let flag = &mut self.flags[index];
        if *flag == 1 {
            *flag = 0;
            self.candidates -= 1;
        }
    }

    /// `first` から `step` おきに末尾まで消す。
    pub fn strike_every(&mut self, first: usize, step: usize) {
        let mut i = first;
        while i < self.flags.len() {
            self.strike(i);
            i += step;
        }
    }

    fn index_of(&self, value: u64) -> Option<usize> {
        value
            .checked_sub(self.start)
            .filter(|&offset| offset < self.flags.len() as u64)
            .map(|offset| offset as usize)
    }

    fn strike_value(&mut self, value: u64) {
        if let Some(i) = self.index_of(value) {
            self.strike(i);
        }
    }

    fn reinstate_value(&mut self, value: u64) {
        if let Some(i) = self.index_of(value) {
            if self.flags[i] == 0 {
                self.flags[i] = 1;
                self.candidates += 1;
            }
        }
    }

    /// 残った添字を昇順の値に変換する。確保サイズは追跡中の候補数ちょうど。
    pub fn into_primes(self) -> Vec<u64> {
        let mut primes = Vec::with_capacity(self.candidates as usize);
        for (i, &flag) in self.flags.iter().enumerate() {
            if flag == 1 {
                primes.push(self.start + i as u64);
            }
        }
        debug_assert_eq!(primes.len() as u64, self.candidates);
        primes
    }
}
