#[cfg(feature = "tracing")]
macro_rules! mtrace {
    ($($tt:tt)*) => {
        tracing::trace!(target: "flatlist_model", $($tt)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! mtrace {
    ($($tt:tt)*) => {};
}

#[cfg(feature = "tracing")]
macro_rules! mwarn {
    ($($tt:tt)*) => {
        tracing::warn!(target: "flatlist_model", $($tt)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! mwarn {
    ($($tt:tt)*) => {};
}
