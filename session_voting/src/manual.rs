/*!

This is the long-form manual for `session_voting` and `sessionvote`.

## Votings

A session is made of groups of votings. Each voting is either a median voting or a
Schulze voting. All the votings of a session use the same voter roster: every voter
has a name and a weight, the number of votes this voter casts.

### Median votings

A median voting asks for a value, for example an amount of money. Each voter answers
with the value they agree with, between 0 and the requested value. Values are whole
numbers in the smallest unit of the currency (cents, pence, ...).

The votes are sorted from the highest to the lowest value. Walking down from the
highest value, the agreed value is the first one at which the accumulated weight of
the votes is more than the majority threshold. The requested value is accepted when
the weight of the votes for the full value is more than the threshold.

Votes above the requested value are not counted and reported as warnings.

### Schulze votings

A Schulze voting ranks at least two options. Each voter gives a position to every
option: smaller positions are preferred, equal positions mean that the voter does not
care. By convention the last option is the "No" option.

The ballot of a voter must list every option exactly once, in the order of the options
of the voting. Other ballots are not counted and reported as warnings.

The ranking follows the Schulze method. The summary also reports for each option the
weight of the voters that ranked it above the "No" option, and the options for which
this weight is more than the majority threshold.

### Majorities

The majority of a voting is one of:
* `"50"`: more than half of the votes
* `"2/3"`: more than two thirds of the votes
* an explicit fraction between 0 and 1, for example `{"numerator": 3, "denominator": 4}`

The threshold is the share of the total weight, rounded down. A voting needs strictly
more votes than the threshold: with 10 votes and a simple majority, the threshold is 5
and 6 votes are required.

### Counting all voters

When `countAllVoters` is set, the voters that did not cast a valid vote are counted too:
as voting for 0 in a median voting, and with all the options tied in a Schulze voting.
Otherwise they are left out of the total weight.

## Session file

`sessionvote` reads a session in JSON format:

```text
{
  "name": "Plenum",
  "revision": "WS 2023",
  "voters": [{"name": "Anna", "weight": 3}, {"name": "Bob", "weight": 1}],
  "groups": [
    {"name": "Finances", "votings": [
      {"type": "median", "name": "Summer party", "majority": "50",
       "value": 50000, "currency": "EUR", "countAllVoters": true,
       "votes": [{"voter": "Anna", "value": 30000}]}
    ]},
    {"name": "Elections", "votings": [
      {"type": "schulze", "name": "Treasurer", "majority": "2/3",
       "options": ["Dora", "Emil", "No"],
       "votes": [{"voter": "Bob", "ranking": [["Dora", 1], ["Emil", 1], ["No", 2]]}]}
    ]}
  ]
}
```

`revision`, `voters`, `countAllVoters`, `currency` and `votes` are optional.

Votes may refer to voters that are not in the roster, or to options that the voting does
not have. These votes are not counted and show up as warnings in the summary.

## Voter roster

The option `--voters` reads the voter roster from a CSV file instead. The file has a
header row and the columns `name` and `weight`:

```text
name,weight
Anna,3
Bob,1
```

## Output

The summary is written in JSON format with `--out` (a file path or `stdout`). It contains,
for each group and each voting, the total weight, the threshold, the tabulated votes and
the warnings of the voting. With `--reference`, the summary is compared with a reference
summary and the differences are printed.

 */
