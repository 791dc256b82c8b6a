use crate::flags::FlagBuffer;
use crate::lane_marker::FlagMarker;

/// スケジューラが切り出す 1 ブロック `[start, start + length)`。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockDescriptor {
    pub start: u64,
    pub length: u64,
}

impl BlockDescriptor {
    pub fn end(&self) -> u64 {
        self.start + self.length
    }
}

/// ブロック内の素数を昇順で返す。
///
/// `base_primes` は `sqrt(end)` 以下の素数をすべて含んでいる必要がある。
/// 共有状態を持たないため、複数ブロックを並列に呼んでもロックは不要。
pub fn sieve_block(
    block: BlockDescriptor,
    base_primes: &[u64],
    marker: &dyn FlagMarker,
) -> Vec<u64> {
    sieve_block_buffer(block, base_primes, marker).into_primes()
}

/// ブロック篩を実行し、素数の抽出前のフラグバッファを返す。
pub fn sieve_block_buffer(
    block: BlockDescriptor,
    base_primes: &[u64],
    marker: &dyn FlagMarker,
) -> FlagBuffer {
    let start = block.start;
    let end = block.end();
    let mut buffer = FlagBuffer::new(start, block.length as usize, marker);

    for &p in base_primes {
        // 2 と 3 はマーカーで処理済み
        if p == 2 || p == 3 {
            continue;
        }
        let square = p.saturating_mul(p);
        if square >= end {
            break;
        }

        // start 以上で最小の p の倍数。p 自身を消さないよう p^2 未満は飛ばす
        let rem = start % p;
        let first_multiple = if rem == 0 { start } else { start + (p - rem) };
        let first = first_multiple.max(square);
        if first >= end {
            continue;
        }

        buffer.strike_every((first - start) as usize, p as usize);
    }

    buffer
}
