use std::ops::{Index, IndexMut, Range};

/// One step of an edit script. Indices point into the old (`Delete`),
/// new (`Insert`) or both (`Equal`) sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Edit {
    Equal(usize, usize),
    Delete(usize),
    Insert(usize),
}

/// Shortest edit script between `old` and `new`.
///
/// Myers' algorithm in its linear space form: the middle snake of the edit
/// graph splits the problem in two and each half is solved recursively, so
/// memory stays O(N+M) while time is O((N+M)D).
///
/// Within every run of consecutive changes the deletions come before the
/// insertions, so callers can render hunks as "old lines, then new lines".
pub(crate) fn diff<T: PartialEq>(old: &[T], new: &[T]) -> Vec<Edit> {
    let max_d = max_d(old.len(), new.len());
    let mut vf = V::new(max_d);
    let mut vb = V::new(max_d);
    let mut edits = Vec::with_capacity(old.len().max(new.len()));
    conquer(old, 0..old.len(), new, 0..new.len(), &mut vf, &mut vb, &mut edits);
    group_deletions_first(edits)
}

fn max_d(old_len: usize, new_len: usize) -> usize {
    (old_len + new_len + 1) / 2 + 1
}

/// Furthest reaching x per diagonal `k`, indexed by `k` in `-max_d..=max_d`.
struct V {
    offset: isize,
    v: Vec<usize>,
}

impl V {
    fn new(max_d: usize) -> Self {
        Self {
            offset: max_d as isize,
            v: vec![0; 2 * max_d + 1],
        }
    }
}

impl Index<isize> for V {
    type Output = usize;

    fn index(&self, k: isize) -> &usize {
        &self.v[(k + self.offset) as usize]
    }
}

impl IndexMut<isize> for V {
    fn index_mut(&mut self, k: isize) -> &mut usize {
        &mut self.v[(k + self.offset) as usize]
    }
}

fn conquer<T: PartialEq>(
    old: &[T],
    mut old_range: Range<usize>,
    new: &[T],
    mut new_range: Range<usize>,
    vf: &mut V,
    vb: &mut V,
    edits: &mut Vec<Edit>,
) {
    let prefix = common_prefix(&old[old_range.clone()], &new[new_range.clone()]);
    edits.extend((0..prefix).map(|i| Edit::Equal(old_range.start + i, new_range.start + i)));
    old_range.start += prefix;
    new_range.start += prefix;

    let suffix = common_suffix(&old[old_range.clone()], &new[new_range.clone()]);
    old_range.end -= suffix;
    new_range.end -= suffix;

    if old_range.is_empty() {
        edits.extend(new_range.clone().map(Edit::Insert));
    } else if new_range.is_empty() {
        edits.extend(old_range.clone().map(Edit::Delete));
    } else if let Some((x, y)) =
        middle_snake(old, old_range.clone(), new, new_range.clone(), vf, vb)
    {
        conquer(old, old_range.start..x, new, new_range.start..y, vf, vb, edits);
        conquer(old, x..old_range.end, new, y..new_range.end, vf, vb, edits);
    } else {
        edits.extend(old_range.clone().map(Edit::Delete));
        edits.extend(new_range.clone().map(Edit::Insert));
    }

    edits.extend((0..suffix).map(|i| Edit::Equal(old_range.end + i, new_range.end + i)));
}

/// Runs the forward and backward searches towards each other and returns
/// the point where an optimal path crosses from one half to the other.
fn middle_snake<T: PartialEq>(
    old: &[T],
    old_range: Range<usize>,
    new: &[T],
    new_range: Range<usize>,
    vf: &mut V,
    vb: &mut V,
) -> Option<(usize, usize)> {
    let (old_start, new_start) = (old_range.start, new_range.start);
    let old = &old[old_range];
    let new = &new[new_range];
    let n = old.len();
    let m = new.len();
    let delta = n as isize - m as isize;
    let odd = delta & 1 == 1;
    vf[1] = 0;
    vb[1] = 0;

    for d in 0..max_d(n, m) as isize {
        let mut k = -d;
        while k <= d {
            let mut x = if k == -d || (k != d && vf[k - 1] < vf[k + 1]) {
                vf[k + 1]
            } else {
                vf[k - 1] + 1
            };
            let y = (x as isize - k) as usize;
            let (x0, y0) = (x, y);
            if x < n && y < m {
                x += common_prefix(&old[x..], &new[y..]);
            }
            vf[k] = x;
            if odd && (k - delta).abs() <= d - 1 && vf[k] + vb[delta - k] >= n {
                return Some((old_start + x0, new_start + y0));
            }
            k += 2;
        }

        let mut k = -d;
        while k <= d {
            let mut x = if k == -d || (k != d && vb[k - 1] < vb[k + 1]) {
                vb[k + 1]
            } else {
                vb[k - 1] + 1
            };
            let mut y = (x as isize - k) as usize;
            if x < n && y < m {
                let advance = common_suffix(&old[..n - x], &new[..m - y]);
                x += advance;
                y += advance;
            }
            vb[k] = x;
            if !odd && (k - delta).abs() <= d && vb[k] + vf[delta - k] >= n {
                return Some((old_start + n - x, new_start + m - y));
            }
            k += 2;
        }
    }
    None
}

fn common_prefix<T: PartialEq>(old: &[T], new: &[T]) -> usize {
    old.iter().zip(new).take_while(|(a, b)| a == b).count()
}

fn common_suffix<T: PartialEq>(old: &[T], new: &[T]) -> usize {
    old.iter()
        .rev()
        .zip(new.iter().rev())
        .take_while(|(a, b)| a == b)
        .count()
}

fn group_deletions_first(edits: Vec<Edit>) -> Vec<Edit> {
    let mut out = Vec::with_capacity(edits.len());
    let mut deletes = Vec::new();
    let mut inserts = Vec::new();
    for edit in edits {
        match edit {
            Edit::Delete(_) => deletes.push(edit),
            Edit::Insert(_) => inserts.push(edit),
            Edit::Equal(..) => {
                out.append(&mut deletes);
                out.append(&mut inserts);
                out.push(edit);
            }
        }
    }
    out.append(&mut deletes);
    out.append(&mut inserts);
    out
}
