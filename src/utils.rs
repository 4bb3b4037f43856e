// Small helpers shared by the data layer

use std::collections::BTreeSet;

/// Elements of `a` that do not appear in `b`, in the order of `a`.
pub fn difference<'a, A, B>(a: A, b: B) -> Vec<&'a str>
where
    A: IntoIterator<Item = &'a str>,
    B: IntoIterator<Item = &'a str>,
{
    let b: BTreeSet<&str> = b.into_iter().collect();
    a.into_iter().filter(|x| !b.contains(x)).collect()
}
